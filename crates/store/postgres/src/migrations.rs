use sqlx::PgPool;

use ebloodbank_core::DEFAULT_MIN_STOCK;

use crate::config::PostgresConfig;

/// Run database migrations, creating required tables if they do not exist.
///
/// Tables are created in dependency order so foreign keys resolve. Natural
/// keys that workflows upsert on (`donors.account_id`,
/// `inventory(bloodbank_id, blood_group)`) carry unique constraints.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if any DDL statement fails.
pub async fn run_migrations(pool: &PgPool, config: &PostgresConfig) -> Result<(), sqlx::Error> {
    let accounts = config.accounts_table();
    let banks = config.banks_table();
    let requests = config.requests_table();
    let donors = config.donors_table();
    let donations = config.donations_table();
    let inventory = config.inventory_table();
    let appointments = config.appointments_table();
    let email_index = format!("{}accounts_email_idx", config.table_prefix);

    let statements = [
        format!(
            "CREATE TABLE IF NOT EXISTS {accounts} (
                id UUID PRIMARY KEY,
                username TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT NOT NULL,
                full_name TEXT NOT NULL,
                kind TEXT NOT NULL,
                date_of_birth DATE,
                address TEXT,
                city TEXT,
                state TEXT,
                pincode TEXT
            )"
        ),
        format!("CREATE INDEX IF NOT EXISTS {email_index} ON {accounts} (lower(trim(email)))"),
        format!(
            "CREATE TABLE IF NOT EXISTS {banks} (
                id UUID PRIMARY KEY,
                account_id UUID NOT NULL UNIQUE REFERENCES {accounts}(id),
                name TEXT NOT NULL,
                registration_number TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT NOT NULL,
                city TEXT NOT NULL,
                state TEXT NOT NULL,
                is_operational BOOLEAN NOT NULL DEFAULT TRUE,
                code TEXT NOT NULL UNIQUE,
                created_at TIMESTAMPTZ NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {requests} (
                id UUID PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                requester_id UUID NOT NULL REFERENCES {accounts}(id),
                bloodbank_id UUID REFERENCES {banks}(id),
                patient_name TEXT NOT NULL,
                blood_group TEXT NOT NULL,
                units_required INTEGER NOT NULL CHECK (units_required > 0),
                urgency TEXT NOT NULL,
                required_date DATE NOT NULL,
                hospital_name TEXT NOT NULL,
                doctor_name TEXT NOT NULL,
                contact_number TEXT NOT NULL,
                reason TEXT NOT NULL DEFAULT '',
                admin_notes TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL,
                approved_by UUID,
                approved_at TIMESTAMPTZ,
                fulfilled_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                version BIGINT NOT NULL DEFAULT 0
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {donors} (
                id UUID PRIMARY KEY,
                account_id UUID NOT NULL UNIQUE REFERENCES {accounts}(id),
                full_name TEXT NOT NULL,
                blood_group TEXT NOT NULL,
                date_of_birth DATE NOT NULL,
                gender TEXT NOT NULL,
                phone TEXT NOT NULL,
                email TEXT NOT NULL,
                address TEXT NOT NULL,
                city TEXT NOT NULL,
                state TEXT NOT NULL,
                pincode TEXT NOT NULL,
                weight_kg DOUBLE PRECISION NOT NULL,
                last_donation_date DATE,
                is_eligible BOOLEAN NOT NULL DEFAULT TRUE,
                medical_conditions TEXT NOT NULL DEFAULT '',
                emergency_contact TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {donations} (
                id UUID PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                donor_id UUID NOT NULL REFERENCES {donors}(id),
                bloodbank_id UUID NOT NULL REFERENCES {banks}(id),
                blood_group TEXT NOT NULL,
                donation_date DATE NOT NULL,
                units_donated INTEGER NOT NULL CHECK (units_donated > 0),
                hemoglobin_level DOUBLE PRECISION,
                blood_pressure TEXT,
                notes TEXT NOT NULL DEFAULT '',
                verified_by TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {inventory} (
                bloodbank_id UUID NOT NULL REFERENCES {banks}(id),
                blood_group TEXT NOT NULL,
                units_available INTEGER NOT NULL DEFAULT 0,
                min_stock_level INTEGER NOT NULL DEFAULT {DEFAULT_MIN_STOCK},
                last_updated TIMESTAMPTZ NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (bloodbank_id, blood_group)
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {appointments} (
                id UUID PRIMARY KEY,
                account_id UUID NOT NULL REFERENCES {accounts}(id),
                bloodbank_id UUID NOT NULL REFERENCES {banks}(id),
                appointment_date DATE NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )"
        ),
    ];

    for statement in &statements {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}
