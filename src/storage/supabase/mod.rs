//! Clients for the Supabase side of the migration.

pub mod postgres;
pub mod postgrest;

pub use postgres::PostgresStore;
pub use postgrest::PostgrestStore;

/// Table and column names are interpolated into URLs/SQL, so only plain identifiers pass.
pub fn validate_ident(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn ensure_ident(kind: &str, ident: &str) -> anyhow::Result<()> {
    if validate_ident(ident) {
        Ok(())
    } else {
        Err(anyhow::anyhow!("Invalid {} name: {:?}", kind, ident))
    }
}

#[cfg(test)]
mod tests {
    use super::validate_ident;

    #[test]
    fn identifiers() {
        assert!(validate_ident("financial_products"));
        assert!(validate_ident("_t1"));
        assert!(!validate_ident("1abc"));
        assert!(!validate_ident("profiles; drop table x"));
        assert!(!validate_ident(""));
    }
}
