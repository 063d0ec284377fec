//! Identifier Sources
//!
//! The store asks an [`IdSource`] for candidate ids and retries until it
//! gets one that is not already taken, so a source only needs to be
//! collision resistant, not collision free.

use uuid::Uuid;

/// Produces candidate node identifiers.
pub trait IdSource: Send {
    /// Produce a new candidate id.
    fn generate(&mut self) -> String;
}

/// Random v4 UUIDs in their compact (unhyphenated) form.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidSource;

impl IdSource for UuidSource {
    fn generate(&mut self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

impl<F> IdSource for F
where
    F: FnMut() -> String + Send,
{
    fn generate(&mut self) -> String {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_distinct() {
        let mut source = UuidSource;
        let a = source.generate();
        let b = source.generate();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn closures_are_sources() {
        let mut n = 0;
        let mut source = move || {
            n += 1;
            format!("id-{n}")
        };
        assert_eq!(IdSource::generate(&mut source), "id-1");
        assert_eq!(IdSource::generate(&mut source), "id-2");
    }
}
