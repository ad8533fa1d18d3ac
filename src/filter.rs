//! In-memory narrowing of the constituent catalog.

use crate::catalog::CatalogEntry;

/// A user's choice on one filter axis. `All` places no restriction;
/// `Exact` is case-sensitive equality on the respective field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Exact(String),
}

impl Selection {
    /// Maps an optional CLI argument to a selection. An omitted flag and
    /// the literal word "all" (any case) both mean no restriction.
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None => Selection::All,
            Some(s) if s.eq_ignore_ascii_case("all") => Selection::All,
            Some(s) => Selection::Exact(s.to_string()),
        }
    }

    fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Exact(expected) => expected == value,
        }
    }
}

/// Narrows the catalog by sector and symbol. Both axes compose with AND.
/// Pure; preserves the catalog's order.
pub fn filter(
    catalog: &[CatalogEntry],
    sector: &Selection,
    symbol: &Selection,
) -> Vec<CatalogEntry> {
    catalog
        .iter()
        .filter(|entry| sector.matches(&entry.sector) && symbol.matches(&entry.symbol))
        .cloned()
        .collect()
}

/// Distinct sectors present in the catalog, sorted. Drives the sector
/// selection control.
pub fn sectors(catalog: &[CatalogEntry]) -> Vec<String> {
    let mut sectors: Vec<String> = catalog.iter().map(|e| e.sector.clone()).collect();
    sectors.sort();
    sectors.dedup();
    sectors
}

/// All symbols in the catalog, sorted. Drives the symbol selection control.
pub fn symbols(catalog: &[CatalogEntry]) -> Vec<String> {
    let mut symbols: Vec<String> = catalog.iter().map(|e| e.symbol.clone()).collect();
    symbols.sort();
    symbols
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(symbol: &str, name: &str, sector: &str) -> CatalogEntry {
        CatalogEntry {
            symbol: symbol.to_string(),
            name: name.to_string(),
            sector: sector.to_string(),
        }
    }

    fn sample_catalog() -> Vec<CatalogEntry> {
        vec![
            entry("AAPL", "Apple Inc.", "Information Technology"),
            entry("JPM", "JPMorgan Chase", "Financials"),
            entry("MSFT", "Microsoft", "Information Technology"),
            entry("XOM", "Exxon Mobil", "Energy"),
        ]
    }

    #[test]
    fn test_all_all_is_identity() {
        let catalog = sample_catalog();
        let result = filter(&catalog, &Selection::All, &Selection::All);
        assert_eq!(result, catalog);
    }

    #[test]
    fn test_sector_filter_is_exact() {
        let catalog = sample_catalog();
        for sector in sectors(&catalog) {
            let selection = Selection::Exact(sector.clone());
            let result = filter(&catalog, &selection, &Selection::All);
            assert!(!result.is_empty());
            assert!(result.iter().all(|e| e.sector == sector));
            let expected = catalog.iter().filter(|e| e.sector == sector).count();
            assert_eq!(result.len(), expected);
        }
    }

    #[test]
    fn test_symbol_filter_returns_at_most_one() {
        let catalog = sample_catalog();
        for symbol in symbols(&catalog) {
            let result = filter(&catalog, &Selection::All, &Selection::Exact(symbol));
            assert_eq!(result.len(), 1);
        }
        let result = filter(
            &catalog,
            &Selection::All,
            &Selection::Exact("NOTREAL".to_string()),
        );
        assert!(result.is_empty());
    }

    #[test]
    fn test_filters_compose_with_and() {
        let catalog = sample_catalog();
        let result = filter(
            &catalog,
            &Selection::Exact("Energy".to_string()),
            &Selection::Exact("AAPL".to_string()),
        );
        assert!(result.is_empty());

        let result = filter(
            &catalog,
            &Selection::Exact("Information Technology".to_string()),
            &Selection::Exact("AAPL".to_string()),
        );
        assert_eq!(result, vec![catalog[0].clone()]);
    }

    #[test]
    fn test_two_entry_scenario() {
        let catalog = vec![
            entry("AAPL", "Apple Inc.", "Technology"),
            entry("JPM", "JPMorgan Chase", "Financials"),
        ];

        let by_sector = filter(
            &catalog,
            &Selection::Exact("Financials".to_string()),
            &Selection::All,
        );
        assert_eq!(by_sector, vec![catalog[1].clone()]);

        let by_symbol = filter(
            &catalog,
            &Selection::All,
            &Selection::Exact("AAPL".to_string()),
        );
        assert_eq!(by_symbol, vec![catalog[0].clone()]);
    }

    #[test]
    fn test_selection_from_arg() {
        assert_eq!(Selection::from_arg(None), Selection::All);
        assert_eq!(Selection::from_arg(Some("All")), Selection::All);
        assert_eq!(Selection::from_arg(Some("all")), Selection::All);
        assert_eq!(
            Selection::from_arg(Some("Energy")),
            Selection::Exact("Energy".to_string())
        );
    }

    #[test]
    fn test_sectors_are_sorted_and_distinct() {
        let catalog = sample_catalog();
        assert_eq!(
            sectors(&catalog),
            vec!["Energy", "Financials", "Information Technology"]
        );
        assert_eq!(symbols(&catalog), vec!["AAPL", "JPM", "MSFT", "XOM"]);
    }
}
