use ebloodbank_core::{Appointment, AppointmentId, AppointmentStatus, NewAppointment, Principal, now};
use ebloodbank_store::AppointmentFilter;
use tracing::{info, instrument, warn};

use crate::error::GatewayError;
use crate::gateway::Gateway;

impl Gateway {
    /// Book a donation slot at a bank for the caller's account.
    #[instrument(name = "gateway.book_appointment", skip(self, input), fields(account = %principal.account()))]
    pub async fn book_appointment(
        &self,
        principal: &Principal,
        input: NewAppointment,
    ) -> Result<Appointment, GatewayError> {
        self.forbid_bank_operator(principal, "book appointments")?;
        let appointment = input.into_appointment(principal.account(), now())?;
        self.get_bank(appointment.bloodbank).await?;
        self.store.insert_appointment(&appointment).await?;
        self.metrics.increment_appointments_booked();
        info!(
            appointment.id = %appointment.id,
            bank = %appointment.bloodbank,
            date = %appointment.appointment_date,
            "appointment booked"
        );
        Ok(appointment)
    }

    /// Bank operators see their bank's appointments, admins all, everyone
    /// else their own.
    pub async fn list_appointments(
        &self,
        principal: &Principal,
    ) -> Result<Vec<Appointment>, GatewayError> {
        let filter = match principal {
            Principal::BloodBankOperator { bank, .. } => AppointmentFilter {
                bloodbank: Some(*bank),
                ..AppointmentFilter::default()
            },
            Principal::Admin { .. } => AppointmentFilter::default(),
            Principal::Requester { account } => AppointmentFilter {
                account: Some(*account),
                ..AppointmentFilter::default()
            },
        };
        Ok(self.store.list_appointments(&filter).await?)
    }

    /// Move an appointment at the caller's bank to `status`.
    #[instrument(name = "gateway.update_appointment_status", skip(self), fields(account = %principal.account()))]
    pub async fn update_appointment_status(
        &self,
        principal: &Principal,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> Result<Appointment, GatewayError> {
        let bank = self.require_bank_operator(principal, "update appointments")?;
        let current = self
            .store
            .get_appointment(id)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("appointment {id}")))?;
        if current.bloodbank != bank {
            self.metrics.increment_permission_denied();
            warn!(appointment.id = %id, %bank, "appointment belongs to another bank");
            return Err(GatewayError::Forbidden(
                "only the appointment's blood bank can update it".into(),
            ));
        }
        let next = current.transition(status, now())?;
        self.store.update_appointment(&next).await?;
        info!(appointment.id = %id, from = %current.status, to = %status, "appointment updated");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use ebloodbank_core::{AccountKind, BankId};
    use ebloodbank_store::testing::{sample_account, sample_bank};
    use ebloodbank_store_memory::MemoryStore;

    use super::*;
    use crate::builder::GatewayBuilder;

    struct Fixture {
        gw: Gateway,
        requester: Principal,
        operator: Principal,
        other_operator: Principal,
    }

    async fn fixture() -> Fixture {
        let gw = GatewayBuilder::new()
            .store(Arc::new(MemoryStore::new()))
            .build()
            .unwrap();
        let requester = sample_account(AccountKind::Requester);
        gw.register_account(&requester).await.unwrap();
        let mut operators = Vec::new();
        for city in ["Pune", "Nagpur"] {
            let op = sample_account(AccountKind::BloodBank);
            gw.register_account(&op).await.unwrap();
            let bank = gw.register_bank(sample_bank(op.id, city)).await.unwrap();
            operators.push(Principal::BloodBankOperator {
                account: op.id,
                bank: bank.id,
            });
        }
        Fixture {
            gw,
            requester: Principal::Requester {
                account: requester.id,
            },
            operator: operators[0],
            other_operator: operators[1],
        }
    }

    fn booking(bank: BankId) -> NewAppointment {
        NewAppointment {
            bloodbank: bank,
            appointment_date: NaiveDate::from_ymd_opt(2026, 11, 12),
            notes: "morning".into(),
        }
    }

    #[tokio::test]
    async fn book_and_walk_statuses() {
        let f = fixture().await;
        let bank = f.operator.bank().unwrap();
        let appt = f.gw.book_appointment(&f.requester, booking(bank)).await.unwrap();
        assert_eq!(appt.status, AppointmentStatus::Pending);

        let approved = f
            .gw
            .update_appointment_status(&f.operator, appt.id, AppointmentStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, AppointmentStatus::Approved);
        let done = f
            .gw
            .update_appointment_status(&f.operator, appt.id, AppointmentStatus::Completed)
            .await
            .unwrap();
        assert_eq!(done.status, AppointmentStatus::Completed);

        let err = f
            .gw
            .update_appointment_status(&f.operator, appt.id, AppointmentStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(ref v) if v.field == "status"));
    }

    #[tokio::test]
    async fn only_the_appointment_bank_updates() {
        let f = fixture().await;
        let bank = f.operator.bank().unwrap();
        let appt = f.gw.book_appointment(&f.requester, booking(bank)).await.unwrap();

        let err = f
            .gw
            .update_appointment_status(&f.other_operator, appt.id, AppointmentStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));
        let err = f
            .gw
            .update_appointment_status(&f.requester, appt.id, AppointmentStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));
    }

    #[tokio::test]
    async fn booking_rules() {
        let f = fixture().await;
        let err = f
            .gw
            .book_appointment(&f.requester, booking(BankId::generate()))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));

        let bank = f.operator.bank().unwrap();
        let err = f
            .gw
            .book_appointment(&f.operator, booking(bank))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));

        let mut undated = booking(bank);
        undated.appointment_date = None;
        let err = f.gw.book_appointment(&f.requester, undated).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(ref v) if v.field == "appointment_date"));
    }

    #[tokio::test]
    async fn listing_follows_role() {
        let f = fixture().await;
        let bank = f.operator.bank().unwrap();
        f.gw.book_appointment(&f.requester, booking(bank)).await.unwrap();

        assert_eq!(f.gw.list_appointments(&f.requester).await.unwrap().len(), 1);
        assert_eq!(f.gw.list_appointments(&f.operator).await.unwrap().len(), 1);
        assert!(f.gw.list_appointments(&f.other_operator).await.unwrap().is_empty());
        let admin = Principal::Admin {
            account: ebloodbank_core::AccountId::generate(),
        };
        assert_eq!(f.gw.list_appointments(&admin).await.unwrap().len(), 1);
        let stranger = Principal::Requester {
            account: ebloodbank_core::AccountId::generate(),
        };
        assert!(f.gw.list_appointments(&stranger).await.unwrap().is_empty());
    }
}
