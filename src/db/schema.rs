use rusqlite::Connection;

/// Initialize the database schema
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Applications (tenants - everything else hangs off one)
        CREATE TABLE IF NOT EXISTS applications (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            version TEXT NOT NULL DEFAULT '',
            api_key TEXT NOT NULL UNIQUE,
            api_secret_hash TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- License types (plans/tiers; features JSON doubles as default quotas)
        CREATE TABLE IF NOT EXISTS license_types (
            id TEXT PRIMARY KEY,
            application_id TEXT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            duration_days INTEGER NOT NULL CHECK (duration_days >= 1),
            price REAL NOT NULL DEFAULT 0 CHECK (price >= 0),
            is_active INTEGER NOT NULL DEFAULT 1,
            features TEXT NOT NULL DEFAULT '{}',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_license_types_app ON license_types(application_id);

        -- Clients (end customers; email stored trimmed + lowercased)
        CREATE TABLE IF NOT EXISTS clients (
            id TEXT PRIMARY KEY,
            application_id TEXT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            company TEXT,
            contact_person TEXT,
            phone TEXT,
            metadata TEXT NOT NULL DEFAULT '{}',
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,

            UNIQUE(application_id, email)
        );
        CREATE INDEX IF NOT EXISTS idx_clients_app ON clients(application_id);

        -- Licenses (dates are ISO-8601 dates, validity derived on read)
        CREATE TABLE IF NOT EXISTS licenses (
            id TEXT PRIMARY KEY,
            application_id TEXT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
            license_type_id TEXT NOT NULL REFERENCES license_types(id),
            client_id TEXT NOT NULL REFERENCES clients(id),
            license_key TEXT NOT NULL UNIQUE,
            start_date TEXT NOT NULL,
            expiry_date TEXT NOT NULL,
            usage_limits TEXT NOT NULL DEFAULT '{}',
            current_usage TEXT NOT NULL DEFAULT '{}',
            is_active INTEGER NOT NULL DEFAULT 1,
            is_revoked INTEGER NOT NULL DEFAULT 0,
            revocation_reason TEXT,
            last_check INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,

            CHECK (is_revoked = 0 OR is_active = 0)
        );
        CREATE INDEX IF NOT EXISTS idx_licenses_app ON licenses(application_id);
        CREATE INDEX IF NOT EXISTS idx_licenses_client ON licenses(client_id);
        CREATE INDEX IF NOT EXISTS idx_licenses_type ON licenses(license_type_id);

        -- License activities (append-only audit trail)
        CREATE TABLE IF NOT EXISTS license_activities (
            id TEXT PRIMARY KEY,
            license_id TEXT NOT NULL REFERENCES licenses(id) ON DELETE CASCADE,
            activity_type TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            metadata TEXT NOT NULL DEFAULT '{}',
            ip_address TEXT,
            user_agent TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_activities_license ON license_activities(license_id, created_at);
        "#,
    )?;

    Ok(())
}
