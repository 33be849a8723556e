extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    token, Address, Env, Symbol, TryIntoVal, Val, Vec,
};

use crate::events::{
    MilestoneClaimed, ProductionRecorded, SubsidyCompleted, SubsidyCreated, SubsidyFunded,
    SubsidyTerminated, SurplusWithdrawn,
};
use crate::{HydrogenSubsidy, HydrogenSubsidyClient};

struct Parties {
    government: Address,
    company: Address,
    oracle: Address,
}

fn setup(
    required: &[u64],
    amounts: &[i128],
) -> (Env, HydrogenSubsidyClient<'static>, token::Client<'static>, Parties) {
    let env = Env::default();
    env.mock_all_auths();

    let parties = Parties {
        government: Address::generate(&env),
        company: Address::generate(&env),
        oracle: Address::generate(&env),
    };
    let sac = env.register_stellar_asset_contract_v2(Address::generate(&env));
    let token = token::Client::new(&env, &sac.address());

    let contract_id = env.register(
        HydrogenSubsidy,
        (
            parties.government.clone(),
            parties.company.clone(),
            parties.oracle.clone(),
            token.address.clone(),
            Vec::from_slice(&env, required),
            Vec::from_slice(&env, amounts),
        ),
    );
    let client = HydrogenSubsidyClient::new(&env, &contract_id);
    (env, client, token, parties)
}

fn fund(env: &Env, client: &HydrogenSubsidyClient, token: &token::Client, funder: &Address, amount: i128) {
    token::StellarAssetClient::new(env, &token.address).mint(funder, &amount);
    client.fund(funder, &amount);
}

/// Events published by the subsidy contract itself (token events filtered out).
fn contract_events(env: &Env, client: &HydrogenSubsidyClient) -> std::vec::Vec<(Vec<Val>, Val)> {
    env.events()
        .all()
        .iter()
        .filter(|(address, _, _)| address == &client.address)
        .map(|(_, topics, data)| (topics, data))
        .collect()
}

fn topic_symbol(env: &Env, topics: &Vec<Val>) -> Symbol {
    topics.get(0).expect("event without topics").try_into_val(env).unwrap()
}

#[test]
fn test_created_event() {
    let (env, client, _token, parties) = setup(&[200, 500], &[100, 250]);

    let events = contract_events(&env, &client);
    let (topics, data) = events.last().cloned().expect("No events found");
    assert_eq!(topic_symbol(&env, &topics), symbol_short!("created"));

    let event_data: SubsidyCreated = data.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        SubsidyCreated {
            government: parties.government,
            company: parties.company,
            oracle: parties.oracle,
            milestone_count: 2,
            total_subsidy: 350,
        }
    );
}

#[test]
fn test_funded_event() {
    let (env, client, token, parties) = setup(&[200], &[100]);
    fund(&env, &client, &token, &parties.government, 100);

    let events = contract_events(&env, &client);
    let (topics, data) = events.last().cloned().expect("No events found");
    assert_eq!(topic_symbol(&env, &topics), symbol_short!("funded"));

    let event_data: SubsidyFunded = data.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        SubsidyFunded {
            funder: parties.government,
            amount: 100,
        }
    );
}

#[test]
fn test_one_claimed_event_per_milestone() {
    let (env, client, token, parties) = setup(&[500, 200, 900], &[20, 10, 30]);
    fund(&env, &client, &token, &parties.government, 60);

    client.submit_production(&parties.oracle, &600);

    let events = contract_events(&env, &client);
    let claimed: std::vec::Vec<MilestoneClaimed> = events
        .iter()
        .filter(|(topics, _)| topic_symbol(&env, topics) == symbol_short!("claimed"))
        .map(|(topics, data)| {
            let milestone_id: u32 = topics.get(1).unwrap().try_into_val(&env).unwrap();
            let event: MilestoneClaimed = (*data).try_into_val(&env).unwrap();
            assert_eq!(event.milestone_id, milestone_id);
            event
        })
        .collect();

    assert_eq!(
        claimed,
        std::vec![
            MilestoneClaimed {
                milestone_id: 1,
                company: parties.company.clone(),
                amount: 10,
            },
            MilestoneClaimed {
                milestone_id: 0,
                company: parties.company.clone(),
                amount: 20,
            },
        ]
    );

    let produced = events
        .iter()
        .find(|(topics, _)| topic_symbol(&env, topics) == symbol_short!("produced"))
        .expect("no produced event");
    let produced: ProductionRecorded = produced.1.try_into_val(&env).unwrap();
    assert_eq!(
        produced,
        ProductionRecorded {
            oracle: parties.oracle,
            amount: 600,
            total_produced: 600,
        }
    );

    assert!(!events
        .iter()
        .any(|(topics, _)| topic_symbol(&env, topics) == symbol_short!("completed")));
}

#[test]
fn test_completed_event_after_last_claim() {
    let (env, client, token, parties) = setup(&[200], &[100]);
    fund(&env, &client, &token, &parties.government, 100);

    client.submit_production(&parties.oracle, &250);

    let events = contract_events(&env, &client);
    let (topics, data) = events.last().cloned().expect("No events found");
    assert_eq!(topic_symbol(&env, &topics), symbol_short!("completed"));
    let event_data: SubsidyCompleted = data.try_into_val(&env).unwrap();
    assert_eq!(event_data, SubsidyCompleted { total_paid: 100 });
}

#[test]
fn test_surplus_event() {
    let (env, client, token, parties) = setup(&[200], &[100]);
    fund(&env, &client, &token, &parties.government, 175);

    client.withdraw_surplus(&parties.government);

    let events = contract_events(&env, &client);
    let (topics, data) = events.last().cloned().expect("No events found");
    assert_eq!(topic_symbol(&env, &topics), symbol_short!("surplus"));
    let event_data: SurplusWithdrawn = data.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        SurplusWithdrawn {
            government: parties.government,
            amount: 75,
        }
    );
}

#[test]
fn test_terminated_event() {
    let (env, client, token, parties) = setup(&[200], &[100]);
    fund(&env, &client, &token, &parties.government, 100);

    client.terminate(&parties.government, &parties.company);

    let events = contract_events(&env, &client);
    let (topics, data) = events.last().cloned().expect("No events found");
    assert_eq!(topic_symbol(&env, &topics), Symbol::new(&env, "terminated"));
    let event_data: SubsidyTerminated = data.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        SubsidyTerminated {
            government: parties.government,
            company: parties.company,
            refunded: 100,
        }
    );
}
