//! Backend conformance suite and fixtures.
//!
//! Every backend runs [`run_store_conformance_tests`] from its own test
//! module. The suite only creates fresh rows, so it can run against a store
//! that already holds data.

use chrono::{Duration, NaiveDate};
use futures::future::join_all;

use ebloodbank_core::{
    Account, AccountId, AccountKind, AccountProfile, Appointment, AppointmentStatus, BankId,
    BloodBank, BloodGroup, BloodRequest, Donation, DonationId, Donor, DonorId, InventorySet,
    NewAppointment, NewBloodRequest, RequestAction, RequestStatus, Urgency, generate_code, now,
};

use crate::error::StoreError;
use crate::filter::{
    AppointmentFilter, BankFilter, DonationFilter, DonorFilter, InventoryFilter, RequestFilter,
};
use crate::store::{BloodBankStore, CasResult};

/// An account of `kind` with a unique username and e-mail.
#[must_use]
pub fn sample_account(kind: AccountKind) -> Account {
    let id = AccountId::generate();
    Account {
        id,
        username: format!("user-{id}"),
        email: format!("user-{id}@example.org"),
        phone: "+1 (555) 010-0000".into(),
        full_name: format!("Test {kind}"),
        kind,
        profile: AccountProfile::default(),
    }
}

/// A bank operated by `operator`.
#[must_use]
pub fn sample_bank(operator: AccountId, city: &str) -> BloodBank {
    let id = BankId::generate();
    BloodBank {
        id,
        account: operator,
        name: format!("Bank {id}"),
        registration_number: format!("REG-{id}"),
        email: format!("bank-{id}@example.org"),
        phone: "5550100000".into(),
        city: city.into(),
        state: "Test State".into(),
        is_operational: true,
        code: generate_code(),
        created_at: now(),
    }
}

/// A pending request for two units of `O+`.
///
/// # Panics
///
/// Never; the fixture input is valid.
#[must_use]
pub fn sample_request(requester: AccountId) -> BloodRequest {
    NewBloodRequest {
        patient_name: "Test Patient".into(),
        blood_group: BloodGroup::OPositive,
        units_required: 2,
        urgency: Urgency::Normal,
        required_date: now().date_naive() + Duration::days(3),
        hospital_name: "Test Hospital".into(),
        doctor_name: "Dr. Test".into(),
        contact_number: "5550123".into(),
        reason: String::new(),
    }
    .into_request(requester, generate_code(), now())
    .expect("fixture request is valid")
}

#[must_use]
pub fn sample_donation(donor: &Donor, bank: BankId, units: i32, date: NaiveDate) -> Donation {
    Donation {
        id: DonationId::generate(),
        code: generate_code(),
        donor: donor.id,
        bloodbank: bank,
        blood_group: donor.blood_group,
        donation_date: date,
        units_donated: units,
        hemoglobin_level: Some(13.8),
        blood_pressure: Some("120/80".into()),
        notes: String::new(),
        verified_by: "Test Verifier".into(),
        created_at: now(),
    }
}

struct Scenario {
    requester: Account,
    operator: Account,
    bank: BloodBank,
}

async fn scenario(store: &dyn BloodBankStore) -> Result<Scenario, StoreError> {
    let requester = sample_account(AccountKind::Requester);
    let operator = sample_account(AccountKind::BloodBank);
    store.upsert_account(&requester).await?;
    store.upsert_account(&operator).await?;
    let bank = sample_bank(operator.id, "Springfield");
    store.upsert_bank(&bank).await?;
    Ok(Scenario {
        requester,
        operator,
        bank,
    })
}

/// Run the full store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if a store call fails unexpectedly.
///
/// # Panics
///
/// Panics when a backend violates the contract.
pub async fn run_store_conformance_tests(store: &dyn BloodBankStore) -> Result<(), StoreError> {
    test_accounts(store).await?;
    test_banks(store).await?;
    test_request_insert_and_list(store).await?;
    test_request_duplicate_code(store).await?;
    test_request_compare_and_swap(store).await?;
    test_request_concurrent_approve(store).await?;
    test_donor_get_or_create(store).await?;
    test_record_donation_credits(store).await?;
    test_record_donation_rolls_back(store).await?;
    test_concurrent_donations(store).await?;
    test_set_inventory(store).await?;
    test_appointments(store).await?;
    Ok(())
}

async fn test_accounts(store: &dyn BloodBankStore) -> Result<(), StoreError> {
    let account = sample_account(AccountKind::Requester);
    store.upsert_account(&account).await?;
    assert_eq!(store.get_account(account.id).await?, Some(account.clone()));
    assert_eq!(store.get_account(AccountId::generate()).await?, None);

    let shouted = format!("  {}  ", account.email.to_uppercase());
    let found = store.find_account_by_email(&shouted).await?;
    assert_eq!(found.map(|a| a.id), Some(account.id), "email lookup ignores case");
    assert_eq!(store.find_account_by_email("nobody@example.org").await?, None);

    let mut renamed = account.clone();
    renamed.full_name = "Renamed".into();
    store.upsert_account(&renamed).await?;
    assert_eq!(
        store.get_account(account.id).await?.map(|a| a.full_name),
        Some("Renamed".into())
    );
    Ok(())
}

async fn test_banks(store: &dyn BloodBankStore) -> Result<(), StoreError> {
    let s = scenario(store).await?;
    assert_eq!(store.get_bank(s.bank.id).await?, Some(s.bank.clone()));
    assert_eq!(
        store.find_bank_by_account(s.operator.id).await?.map(|b| b.id),
        Some(s.bank.id)
    );
    assert_eq!(store.find_bank_by_account(s.requester.id).await?, None);

    let orphan = sample_bank(AccountId::generate(), "Springfield");
    let err = store.upsert_bank(&orphan).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");

    let city = format!("City-{}", s.bank.id);
    let other_operator = sample_account(AccountKind::BloodBank);
    store.upsert_account(&other_operator).await?;
    let elsewhere = sample_bank(other_operator.id, &city);
    store.upsert_bank(&elsewhere).await?;
    let listed = store
        .list_banks(&BankFilter {
            city: Some(city.to_lowercase()),
        })
        .await?;
    assert_eq!(listed.iter().map(|b| b.id).collect::<Vec<_>>(), vec![elsewhere.id]);
    Ok(())
}

async fn test_request_insert_and_list(store: &dyn BloodBankStore) -> Result<(), StoreError> {
    let s = scenario(store).await?;
    let first = sample_request(s.requester.id);
    let second = sample_request(s.requester.id);
    store.insert_request(&first).await?;
    store.insert_request(&second).await?;

    assert_eq!(store.get_request(first.id).await?, Some(first.clone()));

    let mine = store
        .list_requests(&RequestFilter {
            requester: Some(s.requester.id),
            ..RequestFilter::default()
        })
        .await?;
    let ids: Vec<_> = mine.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id], "newest first");

    let approved = store
        .list_requests(&RequestFilter {
            requester: Some(s.requester.id),
            status: Some(RequestStatus::Approved),
            ..RequestFilter::default()
        })
        .await?;
    assert!(approved.is_empty());
    Ok(())
}

async fn test_request_duplicate_code(store: &dyn BloodBankStore) -> Result<(), StoreError> {
    let s = scenario(store).await?;
    let original = sample_request(s.requester.id);
    store.insert_request(&original).await?;

    let mut clash = sample_request(s.requester.id);
    clash.code.clone_from(&original.code);
    let err = store.insert_request(&clash).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)), "got {err:?}");
    assert_eq!(store.get_request(clash.id).await?, None);
    Ok(())
}

async fn test_request_compare_and_swap(store: &dyn BloodBankStore) -> Result<(), StoreError> {
    let s = scenario(store).await?;
    let request = sample_request(s.requester.id);
    store.insert_request(&request).await?;

    let approve = RequestAction::Approve {
        bank: s.bank.id,
        by: s.operator.id,
    };
    let next = request.apply(approve, now()).expect("pending approves");
    let swapped = store.compare_and_swap_request(&next, request.version).await?;
    assert_eq!(swapped, CasResult::Swapped(next.clone()));
    assert_eq!(store.get_request(request.id).await?, Some(next.clone()));

    // A writer still holding the old version loses and sees the new row.
    let stale = request
        .apply(RequestAction::Cancel, now())
        .expect("pending cancels");
    match store.compare_and_swap_request(&stale, request.version).await? {
        CasResult::Conflict { current } => assert_eq!(current, next),
        CasResult::Swapped(_) => panic!("stale version must not swap"),
    }

    let missing = sample_request(s.requester.id);
    let err = store
        .compare_and_swap_request(&missing, missing.version)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");
    Ok(())
}

async fn test_request_concurrent_approve(store: &dyn BloodBankStore) -> Result<(), StoreError> {
    let s = scenario(store).await?;
    let request = sample_request(s.requester.id);
    store.insert_request(&request).await?;

    let candidates: Vec<_> = (0..4)
        .map(|_| {
            request
                .apply(
                    RequestAction::Approve {
                        bank: s.bank.id,
                        by: s.operator.id,
                    },
                    now(),
                )
                .expect("pending approves")
        })
        .collect();
    let results = join_all(
        candidates
            .iter()
            .map(|c| store.compare_and_swap_request(c, request.version)),
    )
    .await;

    let mut winners = 0;
    for result in results {
        if matches!(result?, CasResult::Swapped(_)) {
            winners += 1;
        }
    }
    assert_eq!(winners, 1, "exactly one concurrent swap wins");
    Ok(())
}

async fn test_donor_get_or_create(store: &dyn BloodBankStore) -> Result<(), StoreError> {
    let s = scenario(store).await?;
    let first = Donor::minimal_for(&s.requester, Some(BloodGroup::BNegative), now());
    let created = store.get_or_create_donor(&first).await?;
    assert_eq!(created.id, first.id);

    // A second candidate for the same account resolves to the stored row.
    let second = Donor::minimal_for(&s.requester, Some(BloodGroup::APositive), now());
    let existing = store.get_or_create_donor(&second).await?;
    assert_eq!(existing.id, first.id);
    assert_eq!(existing.blood_group, BloodGroup::BNegative);

    assert_eq!(
        store.find_donor_by_account(s.requester.id).await?.map(|d| d.id),
        Some(first.id)
    );
    assert_eq!(store.get_donor(first.id).await?.map(|d| d.account), Some(s.requester.id));
    assert_eq!(store.get_donor(DonorId::generate()).await?, None);

    let listed = store
        .list_donors(&DonorFilter {
            account: Some(s.requester.id),
            blood_group: Some(BloodGroup::BNegative),
            ..DonorFilter::default()
        })
        .await?;
    assert_eq!(listed.len(), 1);
    let none = store
        .list_donors(&DonorFilter {
            account: Some(s.requester.id),
            blood_group: Some(BloodGroup::APositive),
            ..DonorFilter::default()
        })
        .await?;
    assert!(none.is_empty());
    Ok(())
}

async fn test_record_donation_credits(store: &dyn BloodBankStore) -> Result<(), StoreError> {
    let s = scenario(store).await?;
    let donor = store
        .get_or_create_donor(&Donor::minimal_for(
            &s.requester,
            Some(BloodGroup::APositive),
            now(),
        ))
        .await?;
    let date = NaiveDate::from_ymd_opt(2026, 9, 14).expect("valid date");

    assert_eq!(store.get_inventory(s.bank.id, BloodGroup::APositive).await?, None);
    let row = store
        .record_donation(&sample_donation(&donor, s.bank.id, 2, date))
        .await?;
    assert_eq!(row.units_available, 2);
    assert_eq!(row.min_stock_level, ebloodbank_core::DEFAULT_MIN_STOCK);

    let later = date + Duration::days(90);
    let row = store
        .record_donation(&sample_donation(&donor, s.bank.id, 3, later))
        .await?;
    assert_eq!(row.units_available, 5);

    let stored = store.get_inventory(s.bank.id, BloodGroup::APositive).await?;
    assert_eq!(stored.map(|i| i.units_available), Some(5));
    let donor_after = store.get_donor(donor.id).await?.expect("donor exists");
    assert_eq!(donor_after.last_donation_date, Some(later));

    let donations = store
        .list_donations(&DonationFilter {
            donor: Some(donor.id),
            ..DonationFilter::default()
        })
        .await?;
    let dates: Vec<_> = donations.iter().map(|d| d.donation_date).collect();
    assert_eq!(dates, vec![later, date], "newest donation first");
    Ok(())
}

async fn test_record_donation_rolls_back(store: &dyn BloodBankStore) -> Result<(), StoreError> {
    let s = scenario(store).await?;
    let donor = store
        .get_or_create_donor(&Donor::minimal_for(
            &s.requester,
            Some(BloodGroup::ONegative),
            now(),
        ))
        .await?;
    let date = NaiveDate::from_ymd_opt(2026, 8, 1).expect("valid date");
    let first = sample_donation(&donor, s.bank.id, 1, date);
    store.record_donation(&first).await?;

    // Code collision: nothing of the second donation may stick.
    let mut clash = sample_donation(&donor, s.bank.id, 4, date + Duration::days(60));
    clash.code.clone_from(&first.code);
    let err = store.record_donation(&clash).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)), "got {err:?}");

    // Unknown bank: same.
    let lost = sample_donation(&donor, BankId::generate(), 4, date + Duration::days(61));
    let err = store.record_donation(&lost).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");

    // Unknown donor: same.
    let mut ghost_donor = donor.clone();
    ghost_donor.id = DonorId::generate();
    let ghost = sample_donation(&ghost_donor, s.bank.id, 4, date + Duration::days(62));
    let err = store.record_donation(&ghost).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");

    let row = store.get_inventory(s.bank.id, BloodGroup::ONegative).await?;
    assert_eq!(row.map(|i| i.units_available), Some(1));
    let donor_after = store.get_donor(donor.id).await?.expect("donor exists");
    assert_eq!(donor_after.last_donation_date, Some(date));
    let donations = store
        .list_donations(&DonationFilter {
            bloodbank: Some(s.bank.id),
            ..DonationFilter::default()
        })
        .await?;
    assert_eq!(donations.len(), 1);

    // Credit overflow: the donation row and donor history go with it.
    store
        .set_inventory(
            s.bank.id,
            &InventorySet {
                blood_group: BloodGroup::ONegative,
                units_available: i32::MAX,
                min_stock_level: None,
            },
            now(),
        )
        .await?;
    let overflow = sample_donation(&donor, s.bank.id, 1, date + Duration::days(90));
    assert!(store.record_donation(&overflow).await.is_err());

    let row = store.get_inventory(s.bank.id, BloodGroup::ONegative).await?;
    assert_eq!(row.map(|i| i.units_available), Some(i32::MAX));
    let donor_after = store.get_donor(donor.id).await?.expect("donor exists");
    assert_eq!(donor_after.last_donation_date, Some(date));
    let donations = store
        .list_donations(&DonationFilter {
            bloodbank: Some(s.bank.id),
            ..DonationFilter::default()
        })
        .await?;
    assert_eq!(donations.len(), 1);
    Ok(())
}

async fn test_concurrent_donations(store: &dyn BloodBankStore) -> Result<(), StoreError> {
    let s = scenario(store).await?;
    let donor = store
        .get_or_create_donor(&Donor::minimal_for(
            &s.requester,
            Some(BloodGroup::AbPositive),
            now(),
        ))
        .await?;
    store
        .set_inventory(
            s.bank.id,
            &InventorySet {
                blood_group: BloodGroup::AbPositive,
                units_available: 7,
                min_stock_level: None,
            },
            now(),
        )
        .await?;

    let date = NaiveDate::from_ymd_opt(2026, 7, 1).expect("valid date");
    let donations: Vec<_> = (1..=10)
        .map(|units| sample_donation(&donor, s.bank.id, units, date))
        .collect();
    let results = join_all(donations.iter().map(|d| store.record_donation(d))).await;
    for result in results {
        result?;
    }

    let row = store.get_inventory(s.bank.id, BloodGroup::AbPositive).await?;
    assert_eq!(row.map(|i| i.units_available), Some(7 + 55), "no lost credits");
    Ok(())
}

async fn test_set_inventory(store: &dyn BloodBankStore) -> Result<(), StoreError> {
    let s = scenario(store).await?;
    let now = now();
    let created = store
        .set_inventory(
            s.bank.id,
            &InventorySet {
                blood_group: BloodGroup::BPositive,
                units_available: 30,
                min_stock_level: Some(10),
            },
            now,
        )
        .await?;
    assert_eq!((created.units_available, created.min_stock_level), (30, 10));

    let untouched = store
        .set_inventory(
            s.bank.id,
            &InventorySet {
                blood_group: BloodGroup::BNegative,
                units_available: 4,
                min_stock_level: None,
            },
            now,
        )
        .await?;
    assert_eq!(untouched.min_stock_level, ebloodbank_core::DEFAULT_MIN_STOCK);
    assert!(untouched.is_low_stock());

    // Absolute, and the threshold survives when not supplied.
    let reset = store
        .set_inventory(
            s.bank.id,
            &InventorySet {
                blood_group: BloodGroup::BPositive,
                units_available: 12,
                min_stock_level: None,
            },
            now,
        )
        .await?;
    assert_eq!((reset.units_available, reset.min_stock_level), (12, 10));

    let rows = store
        .list_inventory(&InventoryFilter {
            bloodbank: Some(s.bank.id),
            ..InventoryFilter::default()
        })
        .await?;
    assert_eq!(rows.len(), 2);
    let b_neg = rows
        .iter()
        .find(|r| r.blood_group == BloodGroup::BNegative)
        .map(|r| r.units_available);
    assert_eq!(b_neg, Some(4), "other groups are not disturbed");

    let only = store
        .list_inventory(&InventoryFilter {
            bloodbank: Some(s.bank.id),
            blood_group: Some(BloodGroup::BPositive),
        })
        .await?;
    assert_eq!(only.len(), 1);
    Ok(())
}

async fn test_appointments(store: &dyn BloodBankStore) -> Result<(), StoreError> {
    let s = scenario(store).await?;
    let now = now();
    let appointment = NewAppointment {
        bloodbank: s.bank.id,
        appointment_date: Some(now.date_naive() + Duration::days(5)),
        notes: "morning".into(),
    }
    .into_appointment(s.requester.id, now)
    .expect("valid appointment");
    let earlier = NewAppointment {
        bloodbank: s.bank.id,
        appointment_date: Some(now.date_naive() + Duration::days(1)),
        notes: String::new(),
    }
    .into_appointment(s.requester.id, now)
    .expect("valid appointment");
    store.insert_appointment(&appointment).await?;
    store.insert_appointment(&earlier).await?;

    assert_eq!(
        store.get_appointment(appointment.id).await?,
        Some(appointment.clone())
    );
    let listed = store
        .list_appointments(&AppointmentFilter {
            bloodbank: Some(s.bank.id),
            ..AppointmentFilter::default()
        })
        .await?;
    let ids: Vec<_> = listed.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![earlier.id, appointment.id], "soonest first");

    let approved = appointment
        .transition(AppointmentStatus::Approved, now)
        .expect("pending approves");
    store.update_appointment(&approved).await?;
    assert_eq!(
        store.get_appointment(appointment.id).await?.map(|a| a.status),
        Some(AppointmentStatus::Approved)
    );

    let ghost = Appointment {
        id: ebloodbank_core::AppointmentId::generate(),
        ..approved
    };
    let err = store.update_appointment(&ghost).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");
    Ok(())
}
