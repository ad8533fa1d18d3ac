//! One render pass of the dashboard: fetch, narrow, present.

use crate::catalog::{CatalogEntry, CatalogProvider};
use crate::filter::{self, Selection};
use crate::history::{HistoryOutcome, HistoryProvider};
use crate::stats::{ColumnStats, SeriesStats};
use crate::ui;
use anyhow::Result;
use comfy_table::Cell;
use tracing::debug;

const SPARKLINE_WIDTH: usize = 60;

/// The filtered constituent table for display.
#[derive(Debug)]
pub struct CatalogView {
    pub entries: Vec<CatalogEntry>,
    pub total: usize,
}

impl CatalogView {
    pub fn build(
        catalog: Vec<CatalogEntry>,
        sector: &Selection,
        symbol: &Selection,
    ) -> CatalogView {
        let total = catalog.len();
        let entries = filter::filter(&catalog, sector, symbol);
        CatalogView { entries, total }
    }

    pub fn display_as_table(&self) -> String {
        if self.entries.is_empty() {
            return ui::style_text("No constituents match the selection.", ui::StyleType::Subtle);
        }

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Symbol"),
            ui::header_cell("Security"),
            ui::header_cell("GICS Sector"),
        ]);
        for entry in &self.entries {
            table.add_row(vec![
                Cell::new(&entry.symbol),
                Cell::new(&entry.name),
                Cell::new(&entry.sector),
            ]);
        }

        let footer = format!("{} of {} constituents", self.entries.len(), self.total);
        format!(
            "{}\n{}",
            table,
            ui::style_text(&footer, ui::StyleType::Subtle)
        )
    }
}

/// Sector selection control data: each distinct sector with its
/// constituent count, sorted by sector name.
#[derive(Debug)]
pub struct SectorView {
    pub sectors: Vec<(String, usize)>,
}

impl SectorView {
    pub fn build(catalog: &[CatalogEntry]) -> SectorView {
        let sectors = filter::sectors(catalog)
            .into_iter()
            .map(|sector| {
                let count = catalog.iter().filter(|e| e.sector == sector).count();
                (sector, count)
            })
            .collect();
        SectorView { sectors }
    }

    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("GICS Sector"),
            ui::header_cell("Constituents"),
        ]);
        for (sector, count) in &self.sectors {
            table.add_row(vec![Cell::new(sector), ui::value_cell(count.to_string())]);
        }
        table.to_string()
    }
}

/// Everything the per-symbol view renders: the catalog entry when the
/// symbol is a known constituent, the history outcome, and statistics when
/// a series came back.
#[derive(Debug)]
pub struct SymbolReport {
    pub symbol: String,
    pub entry: Option<CatalogEntry>,
    pub outcome: HistoryOutcome,
    pub stats: Option<SeriesStats>,
}

impl SymbolReport {
    pub fn build(symbol: &str, catalog: &[CatalogEntry], outcome: HistoryOutcome) -> SymbolReport {
        let entry = catalog.iter().find(|e| e.symbol == symbol).cloned();
        let stats = outcome.series().and_then(SeriesStats::describe);
        SymbolReport {
            symbol: symbol.to_string(),
            entry,
            outcome,
            stats,
        }
    }

    pub fn display(&self) -> String {
        let mut output = String::new();

        let title = match &self.entry {
            Some(entry) => format!("{} - {} ({})", entry.symbol, entry.name, entry.sector),
            None => self.symbol.clone(),
        };
        output.push_str(&ui::style_text(&title, ui::StyleType::Title));
        output.push('\n');
        if self.entry.is_none() {
            output.push_str(&ui::style_text(
                "Not in the constituent list.",
                ui::StyleType::Subtle,
            ));
            output.push('\n');
        }

        match &self.outcome {
            HistoryOutcome::Series(series) => {
                let closes = series.closes();
                let first = closes.first().copied().unwrap_or(0.0);
                let last = closes.last().copied().unwrap_or(0.0);
                let min = closes.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = closes.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

                output.push('\n');
                output.push_str(&ui::style_text("Close, trailing year", ui::StyleType::Label));
                output.push('\n');
                output.push_str(&ui::sparkline(&closes, SPARKLINE_WIDTH));
                output.push('\n');
                output.push_str(&ui::style_text(
                    &format!(
                        "{} bars, first {first:.2}, last {last:.2}, min {min:.2}, max {max:.2}",
                        series.len(),
                    ),
                    ui::StyleType::Subtle,
                ));
                output.push('\n');

                if let Some(stats) = &self.stats {
                    output.push('\n');
                    output.push_str(&ui::style_text(
                        &format!("General statistics for {}:", self.symbol),
                        ui::StyleType::Label,
                    ));
                    output.push('\n');
                    output.push_str(&stats_table(stats).to_string());
                    output.push('\n');
                }
            }
            HistoryOutcome::NoData { reason } => {
                output.push('\n');
                output.push_str(&ui::style_text(
                    &format!("Failed to fetch data for {}.", self.symbol),
                    ui::StyleType::Error,
                ));
                output.push('\n');
                output.push_str(&ui::style_text(reason, ui::StyleType::Subtle));
                output.push('\n');
            }
        }

        output
    }
}

fn stats_table(stats: &SeriesStats) -> comfy_table::Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(""),
        ui::header_cell("Open"),
        ui::header_cell("High"),
        ui::header_cell("Low"),
        ui::header_cell("Close"),
        ui::header_cell("Volume"),
    ]);

    let columns = [
        &stats.open,
        &stats.high,
        &stats.low,
        &stats.close,
        &stats.volume,
    ];

    let row = |label: &str, value: &dyn Fn(&ColumnStats) -> Cell| {
        let mut cells = vec![Cell::new(label)];
        cells.extend(columns.iter().map(|c| value(c)));
        cells
    };

    table.add_row(row("count", &|c| ui::value_cell(c.count.to_string())));
    table.add_row(row("mean", &|c| ui::value_cell(format!("{:.2}", c.mean))));
    table.add_row(row("std", &|c| {
        ui::format_optional_cell(c.std, |s| format!("{s:.2}"))
    }));
    table.add_row(row("min", &|c| ui::value_cell(format!("{:.2}", c.min))));
    table.add_row(row("25%", &|c| ui::value_cell(format!("{:.2}", c.q25))));
    table.add_row(row("50%", &|c| ui::value_cell(format!("{:.2}", c.median))));
    table.add_row(row("75%", &|c| ui::value_cell(format!("{:.2}", c.q75))));
    table.add_row(row("max", &|c| ui::value_cell(format!("{:.2}", c.max))));

    table
}

/// Renders the filtered constituent table.
pub async fn show_catalog(
    provider: &(dyn CatalogProvider + Send + Sync),
    sector: &Selection,
    symbol: &Selection,
) -> Result<()> {
    let pb = ui::new_spinner("Fetching constituent list...");
    let catalog = provider.fetch_catalog().await;
    pb.finish_and_clear();

    let view = CatalogView::build(catalog?, sector, symbol);
    debug!("Rendering {} of {} entries", view.entries.len(), view.total);
    println!("{}", view.display_as_table());
    Ok(())
}

/// Renders the sector overview.
pub async fn show_sectors(provider: &(dyn CatalogProvider + Send + Sync)) -> Result<()> {
    let pb = ui::new_spinner("Fetching constituent list...");
    let catalog = provider.fetch_catalog().await;
    pb.finish_and_clear();

    let view = SectorView::build(&catalog?);
    println!("{}", view.display_as_table());
    Ok(())
}

/// Renders the per-symbol view: chart line plus descriptive statistics, or
/// the no-data message. Catalog failures abort the pass; history failures
/// do not.
pub async fn show_symbol(
    catalog_provider: &(dyn CatalogProvider + Send + Sync),
    history_provider: &(dyn HistoryProvider + Send + Sync),
    symbol: &str,
) -> Result<()> {
    let pb = ui::new_spinner("Fetching constituent list...");
    let catalog = catalog_provider.fetch_catalog().await;
    pb.finish_and_clear();
    let catalog = catalog?;

    let pb = ui::new_spinner("Fetching price history...");
    let outcome = history_provider.fetch_history(symbol).await;
    pb.finish_and_clear();

    let report = SymbolReport::build(symbol, &catalog, outcome);
    println!("{}", report.display());
    Ok(())
}
