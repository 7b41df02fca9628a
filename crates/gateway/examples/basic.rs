//! Basic example: a gateway over the in-memory store walking one request
//! through approval and one donation into stock.
//!
//! Run with: `cargo run -p ebloodbank-gateway --example basic`

use std::sync::Arc;

use chrono::NaiveDate;

use ebloodbank_core::{AccountKind, BloodGroup, DonationInput, NewBloodRequest, Urgency};
use ebloodbank_gateway::GatewayBuilder;
use ebloodbank_store::testing::{sample_account, sample_bank};
use ebloodbank_store_memory::MemoryStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let gateway = GatewayBuilder::new()
        .store(Arc::new(MemoryStore::new()))
        .build()?;

    // Mirror one requester and two banks, as the server does from auth.toml.
    let requester = sample_account(AccountKind::Requester);
    gateway.register_account(&requester).await?;
    let mut operators = Vec::new();
    for city in ["Pune", "Nagpur"] {
        let op = sample_account(AccountKind::BloodBank);
        gateway.register_account(&op).await?;
        let bank = gateway.register_bank(sample_bank(op.id, city)).await?;
        println!("Registered {} ({}) with code {}", bank.name, bank.city, bank.code);
        operators.push(gateway.resolve_principal(op.id).await?);
    }
    let requester = gateway.resolve_principal(requester.id).await?;
    println!();

    println!("=== Scenario 1: two banks race for one request ===");
    let request = gateway
        .create_request(
            &requester,
            NewBloodRequest {
                patient_name: "Ravi Kumar".into(),
                blood_group: BloodGroup::OPositive,
                units_required: 2,
                urgency: Urgency::Emergency,
                required_date: NaiveDate::from_ymd_opt(2026, 10, 25).ok_or("bad date")?,
                hospital_name: "Sassoon General".into(),
                doctor_name: "Dr. Mehta".into(),
                contact_number: "9822012345".into(),
                reason: "surgery".into(),
            },
        )
        .await?;
    println!("  Created request {} ({})", request.code, request.status);

    for operator in &operators {
        match gateway.approve_request(operator, request.id).await {
            Ok(approved) => println!("  Bank {:?} approved: {}", operator.bank(), approved.status),
            Err(e) => println!("  Bank {:?} refused: {e}", operator.bank()),
        }
    }
    println!();

    println!("=== Scenario 2: a donation credits stock ===");
    let recorded = gateway
        .record_donation(
            &operators[0],
            DonationInput {
                account: Some(requester.account()),
                blood_group: Some(BloodGroup::APositive),
                units_donated: Some(3),
                donation_date: NaiveDate::from_ymd_opt(2026, 10, 18),
                verified_by: "Nurse Pillai".into(),
                ..DonationInput::default()
            },
        )
        .await?;
    println!(
        "  Donation {} -> {} now at {} units (low stock: {})",
        recorded.donation.code,
        recorded.inventory.blood_group,
        recorded.inventory.units_available,
        recorded.inventory.is_low_stock()
    );
    println!();

    let snap = gateway.metrics().snapshot();
    println!("=== Gateway Metrics ===");
    println!("  Requests created:     {}", snap.requests_created);
    println!("  Requests approved:    {}", snap.requests_approved);
    println!("  Transition conflicts: {}", snap.transition_conflicts);
    println!("  Donations recorded:   {}", snap.donations_recorded);
    println!("  Units credited:       {}", snap.units_credited);
    Ok(())
}
