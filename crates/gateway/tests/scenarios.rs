//! End-to-end workflow scenarios against the in-memory store.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;

use ebloodbank_core::{
    Account, AccountKind, BloodGroup, BloodRequest, DonationInput, InventorySet, NewBloodRequest,
    Principal, RequestStatus, TransitionError, Urgency,
};
use ebloodbank_gateway::{Gateway, GatewayBuilder, GatewayError};
use ebloodbank_store::RequestFilter;
use ebloodbank_store::testing::{sample_account, sample_bank};
use ebloodbank_store_memory::MemoryStore;

struct World {
    gw: Arc<Gateway>,
    requester: Principal,
    bank_a: Principal,
    bank_b: Principal,
}

async fn world() -> World {
    let gw = GatewayBuilder::new()
        .store(Arc::new(MemoryStore::new()))
        .build()
        .unwrap();

    let requester = sample_account(AccountKind::Requester);
    gw.register_account(&requester).await.unwrap();

    let mut banks = Vec::new();
    for city in ["Pune", "Nagpur"] {
        let op = sample_account(AccountKind::BloodBank);
        gw.register_account(&op).await.unwrap();
        gw.register_bank(sample_bank(op.id, city)).await.unwrap();
        banks.push(gw.resolve_principal(op.id).await.unwrap());
    }

    World {
        requester: gw.resolve_principal(requester.id).await.unwrap(),
        gw: Arc::new(gw),
        bank_a: banks[0],
        bank_b: banks[1],
    }
}

fn two_units_o_positive() -> NewBloodRequest {
    NewBloodRequest {
        patient_name: "Ravi Kumar".into(),
        blood_group: BloodGroup::OPositive,
        units_required: 2,
        urgency: Urgency::Emergency,
        required_date: NaiveDate::from_ymd_opt(2026, 10, 25).unwrap(),
        hospital_name: "Sassoon General".into(),
        doctor_name: "Dr. Mehta".into(),
        contact_number: "9822012345".into(),
        reason: "surgery".into(),
    }
}

async fn create(w: &World) -> BloodRequest {
    w.gw.create_request(&w.requester, two_units_o_positive())
        .await
        .unwrap()
}

async fn stored(w: &World, request: &BloodRequest) -> BloodRequest {
    w.gw.get_request(&w.bank_a, request.id).await.unwrap()
}

async fn donor_account(w: &World) -> Account {
    let account = sample_account(AccountKind::Requester);
    w.gw.register_account(&account).await.unwrap();
    account
}

fn donation_for(account: &Account, units: i32, date: NaiveDate) -> DonationInput {
    DonationInput {
        account: Some(account.id),
        blood_group: Some(BloodGroup::APositive),
        units_donated: Some(units),
        donation_date: Some(date),
        hemoglobin_level: Some(14.1),
        blood_pressure: Some("118/76".into()),
        verified_by: "Nurse Pillai".into(),
        ..DonationInput::default()
    }
}

#[tokio::test]
async fn second_bank_cannot_approve_an_approved_request() {
    let w = world().await;
    let request = create(&w).await;

    let approved = w.gw.approve_request(&w.bank_a, request.id).await.unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.bloodbank, w.bank_a.bank());
    assert_eq!(approved.approved_by, Some(w.bank_a.account()));
    assert!(approved.approved_at.is_some());

    let err = w.gw.approve_request(&w.bank_b, request.id).await.unwrap_err();
    assert!(err.to_string().contains("already approved by another blood bank"));
    assert_eq!(stored(&w, &request).await, approved);
}

#[tokio::test]
async fn rejected_request_can_be_approved_by_another_bank() {
    let w = world().await;
    let request = create(&w).await;

    let rejected = w.gw.reject_request(&w.bank_a, request.id).await.unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(rejected.bloodbank, w.bank_a.bank());

    let approved = w.gw.approve_request(&w.bank_b, request.id).await.unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.bloodbank, w.bank_b.bank());
}

#[tokio::test]
async fn donation_credits_inventory_and_donor_history() {
    let w = world().await;
    let account = donor_account(&w).await;
    let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();

    let recorded = w
        .gw
        .record_donation(&w.bank_a, donation_for(&account, 2, date))
        .await
        .unwrap();
    assert_eq!(recorded.inventory.bloodbank, w.bank_a.bank().unwrap());
    assert_eq!(recorded.inventory.blood_group, BloodGroup::APositive);
    assert_eq!(recorded.inventory.units_available, 2);

    let stock = w.gw.list_inventory(&w.bank_a, Some(BloodGroup::APositive)).await.unwrap();
    assert_eq!(stock.len(), 1);
    assert_eq!(stock[0].units_available, 2);

    let donor = w.gw.get_donor(recorded.donation.donor).await.unwrap();
    assert_eq!(donor.last_donation_date, Some(date));
}

#[tokio::test]
async fn rejecting_an_approved_request_changes_nothing() {
    let w = world().await;
    let request = create(&w).await;
    let approved = w.gw.approve_request(&w.bank_b, request.id).await.unwrap();

    let err = w.gw.reject_request(&w.bank_a, request.id).await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Transition(TransitionError::AlreadyApproved)
    ));
    assert_eq!(stored(&w, &request).await, approved);
}

#[tokio::test]
async fn rejecting_twice_is_refused() {
    let w = world().await;
    let request = create(&w).await;
    let rejected = w.gw.reject_request(&w.bank_a, request.id).await.unwrap();

    let err = w.gw.reject_request(&w.bank_b, request.id).await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Transition(TransitionError::NotRejectable {
            status: RequestStatus::Rejected
        })
    ));
    assert_eq!(stored(&w, &request).await, rejected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_approvals_have_one_winner() {
    let w = world().await;
    let request = create(&w).await;

    let handles: Vec<_> = [w.bank_a, w.bank_b, w.bank_a, w.bank_b]
        .into_iter()
        .map(|bank| {
            let gw = Arc::clone(&w.gw);
            let id = request.id;
            tokio::spawn(async move { gw.approve_request(&bank, id).await })
        })
        .collect();

    let mut winners = Vec::new();
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(updated) => winners.push(updated),
            Err(GatewayError::Transition(TransitionError::AlreadyApproved)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(winners.len(), 1);
    assert_eq!(conflicts, 3);

    let current = stored(&w, &request).await;
    assert_eq!(current, winners[0]);
    assert_eq!(current.version, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_donations_lose_no_units() {
    let w = world().await;
    let account = donor_account(&w).await;
    let date = NaiveDate::from_ymd_opt(2026, 10, 10).unwrap();

    // create the donor first so every task credits the same group
    w.gw
        .record_donation(&w.bank_a, donation_for(&account, 1, date))
        .await
        .unwrap();
    w.gw
        .set_inventory(
            &w.bank_a,
            InventorySet {
                blood_group: BloodGroup::APositive,
                units_available: 10,
                min_stock_level: None,
            },
        )
        .await
        .unwrap();

    let units: Vec<i32> = (1..=12).map(|i| i % 4 + 1).collect();
    let expected = 10 + units.iter().sum::<i32>();

    let handles: Vec<_> = units
        .iter()
        .map(|&u| {
            let gw = Arc::clone(&w.gw);
            let bank = w.bank_a;
            let input = donation_for(&account, u, date);
            tokio::spawn(async move { gw.record_donation(&bank, input).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stock = w.gw.list_inventory(&w.bank_a, Some(BloodGroup::APositive)).await.unwrap();
    assert_eq!(stock[0].units_available, expected);
    assert_eq!(w.gw.metrics().snapshot().donations_recorded, 13);
}

#[tokio::test]
async fn interleaved_lifecycle_on_one_task() {
    let w = &world().await;
    let requests: Vec<_> = join_all((0..3).map(|_| create(w))).await;

    let outcomes = join_all(requests.iter().map(|r| async move {
        let first = w.gw.reject_request(&w.bank_a, r.id).await;
        let second = w.gw.approve_request(&w.bank_b, r.id).await;
        (first, second)
    }))
    .await;
    for (first, second) in outcomes {
        assert_eq!(first.unwrap().status, RequestStatus::Rejected);
        assert_eq!(second.unwrap().bloodbank, w.bank_b.bank());
    }

    let approved = w
        .gw
        .list_requests(
            &w.requester,
            RequestFilter {
                status: Some(RequestStatus::Approved),
                ..RequestFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(approved.len(), 3);

    let snap = w.gw.metrics().snapshot();
    assert_eq!(snap.requests_created, 3);
    assert_eq!(snap.requests_rejected, 3);
    assert_eq!(snap.requests_approved, 3);
}

#[tokio::test]
async fn role_checks_are_enforced() {
    let w = world().await;
    let err = w
        .gw
        .create_request(&w.bank_a, two_units_o_positive())
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Forbidden(_)));

    let account = donor_account(&w).await;
    let date = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
    let err = w
        .gw
        .record_donation(&w.requester, donation_for(&account, 1, date))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Forbidden(_)));
    assert!(err.to_string().contains("blood bank operators"));
    assert_eq!(w.gw.metrics().snapshot().permission_denied, 2);
}
