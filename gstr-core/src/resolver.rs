//! State resolution: turn free-text place-of-supply values and GSTIN prefixes
//! into canonical jurisdiction codes.

use tracing::debug;

use crate::jurisdiction::{JurisdictionTable, StateCode};
use crate::record::{PlaceOfSupply, TaxRecord};

/// Which rule produced a resolution. Useful for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBy {
    RecipientPrefix,
    CanonicalCode,
    Alias,
    NameOrNumber,
    Unresolved,
}

#[derive(Debug, Clone, Copy)]
pub struct StateResolver<'a> {
    table: &'a JurisdictionTable,
}

impl<'a> StateResolver<'a> {
    pub fn new(table: &'a JurisdictionTable) -> Self {
        Self { table }
    }

    /// Resolve a raw place of supply, preferring the recipient's GSTIN prefix.
    ///
    /// Rules, first match wins:
    /// 1. recipient identifier starts with a known two-digit code
    /// 2. raw value is already a canonical code
    /// 3. raw value is a known alias
    /// 4. raw value is a canonical name or a bare two-digit code
    /// 5. otherwise the trimmed raw value is kept as unresolved
    pub fn resolve_place(
        &self,
        raw: Option<&str>,
        recipient_id: Option<&str>,
    ) -> Option<(PlaceOfSupply, ResolvedBy)> {
        if let Some(entry) = recipient_id.and_then(|id| self.table.by_identifier_prefix(id)) {
            return Some((
                PlaceOfSupply::Resolved(entry.code.clone()),
                ResolvedBy::RecipientPrefix,
            ));
        }

        let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;

        if let Some(entry) = self.table.by_code(raw) {
            return Some((PlaceOfSupply::Resolved(entry.code.clone()), ResolvedBy::CanonicalCode));
        }
        if let Some(entry) = self.table.by_alias(raw) {
            return Some((PlaceOfSupply::Resolved(entry.code.clone()), ResolvedBy::Alias));
        }
        if let Some(entry) = self.table.by_name(raw).or_else(|| self.table.by_number(raw)) {
            return Some((PlaceOfSupply::Resolved(entry.code.clone()), ResolvedBy::NameOrNumber));
        }

        Some((PlaceOfSupply::Unresolved(raw.to_string()), ResolvedBy::Unresolved))
    }

    /// Place of origin from the supplier GSTIN prefix.
    pub fn origin(&self, supplier_id: Option<&str>) -> Option<StateCode> {
        supplier_id
            .and_then(|id| self.table.by_identifier_prefix(id))
            .map(|entry| entry.code.clone())
    }
}

/// Resolve place of supply and derive place of origin for one record.
pub fn resolve_jurisdiction(resolver: &StateResolver<'_>, mut record: TaxRecord) -> TaxRecord {
    let raw = record.place_of_supply.as_ref().map(|p| p.as_str().to_string());
    let resolved = resolver.resolve_place(raw.as_deref(), record.recipient());

    if let Some((PlaceOfSupply::Unresolved(value), _)) = &resolved {
        debug!(invoice = ?record.invoice_number, place = %value, "place of supply left unresolved");
    }

    record.place_of_supply = resolved.map(|(place, _)| place);
    record.place_of_origin = resolver.origin(record.supplier());
    record
}

/// Fill a missing place of supply from the resolved place of origin.
/// Unresolved values are kept; origin is never filled from supply.
pub fn fill_place_of_supply(mut record: TaxRecord) -> TaxRecord {
    if record.place_of_supply.is_none() {
        record.place_of_supply = record.place_of_origin.clone().map(PlaceOfSupply::Resolved);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jurisdiction::ALIASES;
    use proptest::prelude::*;

    fn resolve(raw: Option<&str>, recipient: Option<&str>) -> Option<(String, ResolvedBy)> {
        let table = JurisdictionTable::standard();
        let resolver = StateResolver::new(&table);
        resolver
            .resolve_place(raw, recipient)
            .map(|(place, by)| (place.as_str().to_string(), by))
    }

    #[test]
    fn test_recipient_prefix_overrides_text() {
        let got = resolve(Some("Kerala"), Some("29AABCU9603R1ZM")).unwrap();
        assert_eq!(got, ("29-Karnataka".to_string(), ResolvedBy::RecipientPrefix));
    }

    #[test]
    fn test_unknown_recipient_prefix_falls_through() {
        let got = resolve(Some("Kerala"), Some("URP")).unwrap();
        assert_eq!(got, ("32-Kerala".to_string(), ResolvedBy::NameOrNumber));
    }

    #[test]
    fn test_canonical_code_is_idempotent() {
        let got = resolve(Some("07-Delhi"), None).unwrap();
        assert_eq!(got, ("07-Delhi".to_string(), ResolvedBy::CanonicalCode));
    }

    fn every_known_spelling(table: &JurisdictionTable) -> Vec<String> {
        let mut values: Vec<String> = table
            .states()
            .iter()
            .flat_map(|e| {
                [
                    e.code.as_str().to_string(),
                    e.name.clone(),
                    e.name.to_uppercase(),
                    e.number.clone(),
                ]
            })
            .collect();
        values.extend(ALIASES.iter().map(|(alias, _)| alias.to_string()));
        values
    }

    #[test]
    fn test_resolving_a_resolved_place_is_stable() {
        let table = JurisdictionTable::standard();
        let resolver = StateResolver::new(&table);
        for value in every_known_spelling(&table) {
            let (once, _) = resolver.resolve_place(Some(&value), None).unwrap();
            assert!(matches!(once, PlaceOfSupply::Resolved(_)), "{value:?} left unresolved");

            let (twice, by) = resolver.resolve_place(Some(once.as_str()), None).unwrap();
            assert_eq!(twice, once, "{value:?}");
            assert_eq!(by, ResolvedBy::CanonicalCode);
        }
    }

    #[test]
    fn test_resolve_jurisdiction_twice_is_unchanged() {
        let table = JurisdictionTable::standard();
        let resolver = StateResolver::new(&table);
        let records = vec![
            TaxRecord::new()
                .with_supplier("29AAACK1234K1Z9")
                .with_place_of_supply("tn"),
            TaxRecord::new()
                .with_recipient("07AAACD1234E1Z2")
                .with_place_of_supply("Kerala"),
            TaxRecord::new().with_place_of_supply(" Narnia "),
            TaxRecord::new().with_supplier("24AAACG1234A1Z5"),
        ];
        for record in records {
            let once = resolve_jurisdiction(&resolver, record);
            let twice = resolve_jurisdiction(&resolver, once.clone());
            assert_eq!(twice, once);
        }
    }

    #[test]
    fn test_alias_case_insensitive() {
        assert_eq!(resolve(Some("mh"), None).unwrap().0, "27-Maharashtra");
        assert_eq!(resolve(Some("ORRISHA"), None).unwrap().1, ResolvedBy::Alias);
        assert_eq!(resolve(Some("Pondicherry"), None).unwrap().0, "34-Puducherry");
    }

    #[test]
    fn test_name_and_bare_number() {
        assert_eq!(resolve(Some("west bengal"), None).unwrap().0, "19-West Bengal");
        assert_eq!(resolve(Some("09"), None).unwrap().0, "09-Uttar Pradesh");
        assert_eq!(resolve(Some(" Goa "), None).unwrap().0, "30-Goa");
    }

    #[test]
    fn test_unresolved_kept_verbatim() {
        let got = resolve(Some("Narnia"), None).unwrap();
        assert_eq!(got, ("Narnia".to_string(), ResolvedBy::Unresolved));
        // Bare codes must be zero-padded
        assert_eq!(resolve(Some("9"), None).unwrap().1, ResolvedBy::Unresolved);
    }

    #[test]
    fn test_absent_and_blank() {
        assert!(resolve(None, None).is_none());
        assert!(resolve(Some("  "), None).is_none());
    }

    #[test]
    fn test_origin_from_supplier() {
        let table = JurisdictionTable::standard();
        let resolver = StateResolver::new(&table);
        assert_eq!(
            resolver.origin(Some("33AAACT2727Q1ZW")).unwrap().as_str(),
            "33-Tamil Nadu"
        );
        assert!(resolver.origin(Some("00XXXX")).is_none());
        assert!(resolver.origin(None).is_none());
    }

    #[test]
    fn test_fill_place_of_supply_from_origin() {
        let table = JurisdictionTable::standard();
        let resolver = StateResolver::new(&table);

        let record = TaxRecord::new().with_supplier("24AAACG1234A1Z5");
        let record = fill_place_of_supply(resolve_jurisdiction(&resolver, record));
        assert_eq!(record.place_of_supply.unwrap().as_str(), "24-Gujarat");

        let record = TaxRecord::new()
            .with_supplier("24AAACG1234A1Z5")
            .with_place_of_supply("Narnia");
        let record = fill_place_of_supply(resolve_jurisdiction(&resolver, record));
        assert_eq!(
            record.place_of_supply,
            Some(PlaceOfSupply::Unresolved("Narnia".to_string()))
        );
    }

    #[test]
    fn test_origin_never_filled_from_supply() {
        let table = JurisdictionTable::standard();
        let resolver = StateResolver::new(&table);
        let record = TaxRecord::new().with_place_of_supply("Goa");
        let record = fill_place_of_supply(resolve_jurisdiction(&resolver, record));
        assert!(record.place_of_origin.is_none());
        assert_eq!(record.place_of_supply.unwrap().as_str(), "30-Goa");
    }

    proptest! {
        #[test]
        fn property_resolution_is_idempotent(
            raw in "\\PC{0,24}",
            recipient in proptest::option::of("[0-9A-Z]{0,15}"),
        ) {
            let table = JurisdictionTable::standard();
            let resolver = StateResolver::new(&table);
            if let Some((once, _)) = resolver.resolve_place(Some(&raw), recipient.as_deref()) {
                let again = resolver
                    .resolve_place(Some(once.as_str()), recipient.as_deref())
                    .map(|(place, _)| place);
                prop_assert_eq!(again, Some(once));
            }
        }
    }
}
