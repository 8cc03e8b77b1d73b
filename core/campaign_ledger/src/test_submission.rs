use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::invariants::assert_append_invariant;
use crate::{
    Campaign, Catalog, FlowState, Ledger, LedgerError, PaymentGateway, SimulatedGateway,
    SubmissionFlow,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn campaign(slug: &str) -> Campaign {
    Catalog::builtin().unwrap().find(slug).unwrap().clone()
}

fn setup() -> (Campaign, Ledger, SubmissionFlow) {
    let campaign = campaign("muro-ciencia-2024");
    let ledger = Ledger::initialize(&campaign);
    let flow = SubmissionFlow::new(&campaign);
    (campaign, ledger, flow)
}

#[test]
fn test_full_flow_returns_to_idle() {
    let (_, mut ledger, mut flow) = setup();
    let before = ledger.clone();

    assert_eq!(flow.state(), FlowState::Idle);
    flow.open().unwrap();
    flow.enter_custom("5000").unwrap();
    flow.set_name("Test").unwrap();
    flow.set_message("Por la ciencia").unwrap();

    let pending_id = flow.submit(Utc::now()).unwrap().id.clone();
    assert_eq!(flow.state(), FlowState::Submitting);

    let entry = flow.confirm(&mut ledger).unwrap();
    assert_eq!(flow.state(), FlowState::Confirmed);
    assert_eq!(entry.id, pending_id);
    assert_eq!(entry.name, "Test");
    assert_eq!(entry.message, "Por la ciencia");
    assert_append_invariant(&before, &ledger);
    assert_eq!(ledger.raised(), dec("28450"));
    assert_eq!(flow.last_confirmed(), Some(&entry));

    flow.acknowledge().unwrap();
    assert_eq!(flow.state(), FlowState::Idle);
    assert_eq!(flow.draft().custom, "");
    assert_eq!(flow.draft().name, "");
    assert!(flow.pending().is_none());
}

#[test]
fn test_submit_without_amount_stays_composing() {
    let (_, ledger, mut flow) = setup();
    flow.open().unwrap();

    for text in [
        "",
        "abc",
        "0",
        "-20",
        "  ",
        "1000000000.01",
        "79228162514264337593543950335",
    ] {
        flow.enter_custom(text).unwrap();
        let err = flow.submit(Utc::now()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount), "{text:?}");
        assert_eq!(flow.state(), FlowState::Composing);
    }
    assert!(flow.pending().is_none());
    assert_eq!(ledger.appended().len(), 0);
}

#[test]
fn test_largest_accepted_amount_is_recorded() {
    let (_, mut ledger, mut flow) = setup();
    flow.open().unwrap();
    flow.enter_custom("1000000000").unwrap();
    flow.submit(Utc::now()).unwrap();
    let entry = flow.confirm(&mut ledger).unwrap();
    assert_eq!(entry.amount, crate::types::MAX_DONATION);
    assert_eq!(ledger.raised(), dec("1000023450"));
}

#[test]
fn test_preset_and_custom_are_mutually_exclusive() {
    let (_, _, mut flow) = setup();
    flow.open_with_preset(dec("2500")).unwrap();
    assert_eq!(flow.draft().preset, Some(dec("2500")));

    flow.enter_custom("120.50").unwrap();
    assert_eq!(flow.draft().preset, None);
    assert_eq!(flow.draft().amount().unwrap(), dec("120.50"));

    flow.select_preset(dec("500")).unwrap();
    assert_eq!(flow.draft().custom, "");
    assert_eq!(flow.draft().amount().unwrap(), dec("500"));
}

#[test]
fn test_cancel_discards_draft() {
    let (_, ledger, mut flow) = setup();
    flow.open().unwrap();
    flow.enter_custom("300").unwrap();
    flow.set_name("Ana").unwrap();

    flow.cancel().unwrap();

    assert_eq!(flow.state(), FlowState::Idle);
    assert_eq!(flow.draft().custom, "");
    assert_eq!(flow.draft().name, "");
    assert!(ledger.appended().is_empty());
}

#[test]
fn test_invalid_transitions_are_rejected() {
    let (_, mut ledger, mut flow) = setup();

    assert!(matches!(
        flow.submit(Utc::now()),
        Err(LedgerError::InvalidTransition {
            from: FlowState::Idle,
            ..
        })
    ));
    assert!(flow.cancel().is_err());
    assert!(flow.confirm(&mut ledger).is_err());
    assert!(flow.acknowledge().is_err());
    assert!(flow.enter_custom("10").is_err());

    flow.open().unwrap();
    assert!(flow.open().is_err());
    flow.select_preset(dec("250")).unwrap();
    flow.submit(Utc::now()).unwrap();
    // No aborting once the gateway has the donation.
    assert!(flow.cancel().is_err());
}

#[test]
fn test_rejected_payment_keeps_draft() {
    let (_, ledger, mut flow) = setup();
    flow.open().unwrap();
    flow.enter_custom("750").unwrap();
    flow.submit(Utc::now()).unwrap();

    flow.reject().unwrap();

    assert_eq!(flow.state(), FlowState::Composing);
    assert!(flow.pending().is_none());
    assert_eq!(flow.draft().custom, "750");
    assert!(ledger.appended().is_empty());
}

#[test]
fn test_closed_campaigns_refuse_donations() {
    for slug in ["feria-ciencia-2024", "kits-ciencia-2025"] {
        let campaign = campaign(slug);
        let mut flow = SubmissionFlow::new(&campaign);
        let err = flow.open().unwrap_err();
        assert!(matches!(err, LedgerError::CampaignClosed(s) if s == slug));
        assert_eq!(flow.state(), FlowState::Idle);
    }
}

#[test]
fn test_blank_name_is_recorded_as_anonymous() {
    let (_, mut ledger, mut flow) = setup();
    flow.open_with_preset(dec("1000")).unwrap();
    flow.set_name("   ").unwrap();
    flow.submit(Utc::now()).unwrap();
    let entry = flow.confirm(&mut ledger).unwrap();
    assert_eq!(entry.name, crate::ANONYMOUS);
}

#[tokio::test]
async fn test_simulated_gateway_approves() {
    let (_, mut ledger, mut flow) = setup();
    let gateway = SimulatedGateway::new(Duration::from_millis(5));

    flow.open_with_preset(dec("500")).unwrap();
    let pending = flow.submit(Utc::now()).unwrap().clone();

    let receipt = gateway.process(&pending).await.unwrap();
    assert_eq!(receipt.donation_id, pending.id);

    let entry = flow.confirm(&mut ledger).unwrap();
    assert_eq!(entry, pending);
}
