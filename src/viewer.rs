//! Interactive summary viewer.
//!
//! Shows a [`SummaryTable`] in a native window: search box, sortable and
//! resizable columns, a Class column that can be hidden, and a column-name
//! column that stays put while the field columns scroll sideways.
//!
//! All filtering and ordering lives in [`ViewerState`], which has no egui
//! dependency and is tested directly.

use crate::metadata::SummaryTable;
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use std::cmp::Ordering;

const HEADER_HEIGHT: f32 = 24.0;
const ROW_HEIGHT: f32 = 22.0;
const MISSING: &str = "NA";

/// Header index of the column-name column.
pub const NAME_COLUMN: usize = 0;
/// Header index of the Class column.
pub const CLASS_COLUMN: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    /// Index into [`SummaryTable::header`].
    pub column: usize,
    pub order: SortOrder,
}

/// Search, sort and visibility choices for one viewer window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerState {
    pub search: String,
    pub show_class: bool,
    pub sort: Option<SortKey>,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            search: String::new(),
            show_class: true,
            sort: None,
        }
    }
}

impl ViewerState {
    /// First click sorts ascending, later clicks flip the order.
    pub fn toggle_sort(&mut self, column: usize) {
        self.sort = match self.sort {
            Some(SortKey {
                column: current,
                order: SortOrder::Ascending,
            }) if current == column => Some(SortKey {
                column,
                order: SortOrder::Descending,
            }),
            _ => Some(SortKey {
                column,
                order: SortOrder::Ascending,
            }),
        };
    }

    /// Header indices shown in the scrolling part (everything except the
    /// name column, and Class only when enabled).
    pub fn visible_columns(&self, table: &SummaryTable) -> Vec<usize> {
        (CLASS_COLUMN..table.header.len())
            .filter(|&i| i != CLASS_COLUMN || self.show_class)
            .collect()
    }

    /// Row indices matching the search, in display order.
    ///
    /// The search is a case-insensitive substring match against every cell
    /// of the row. Missing values sort after present ones in either order.
    pub fn visible_rows(&self, table: &SummaryTable) -> Vec<usize> {
        let needle = self.search.trim().to_lowercase();
        let mut rows: Vec<usize> = table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                needle.is_empty()
                    || (0..table.header.len()).any(|i| {
                        row.cell(i)
                            .is_some_and(|c| c.to_lowercase().contains(&needle))
                    })
            })
            .map(|(i, _)| i)
            .collect();

        if let Some(key) = self.sort {
            rows.sort_by(|&a, &b| {
                compare_cells(
                    table.rows[a].cell(key.column),
                    table.rows[b].cell(key.column),
                    key.order,
                )
            });
        }
        rows
    }
}

fn compare_cells(a: Option<&str>, b: Option<&str>, order: SortOrder) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = a.to_lowercase().cmp(&b.to_lowercase());
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        }
    }
}

/// eframe application wrapping one summary table.
pub struct MetadataViewer {
    table: SummaryTable,
    state: ViewerState,
}

impl MetadataViewer {
    pub fn new(table: SummaryTable) -> Self {
        Self {
            table,
            state: ViewerState::default(),
        }
    }

    fn render_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Search:");
            ui.add(egui::TextEdit::singleline(&mut self.state.search).desired_width(240.0));
            if ui.button("Clear").clicked() {
                self.state.search.clear();
            }
            ui.separator();
            ui.checkbox(&mut self.state.show_class, "Show class");
        });
    }

    fn render_tables(&mut self, ui: &mut egui::Ui) {
        let table = &self.table;
        let state = &self.state;
        let rows = state.visible_rows(table);
        let columns = state.visible_columns(table);
        let mut clicked = None;

        ui.label(format!("{} of {} columns", rows.len(), table.rows.len()));
        ui.add_space(4.0);

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.horizontal_top(|ui| {
                    // Sticky name column.
                    TableBuilder::new(ui)
                        .id_salt("viewer_names")
                        .striped(true)
                        .vscroll(false)
                        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                        .column(Column::auto().at_least(100.0).resizable(true))
                        .header(HEADER_HEIGHT, |mut header| {
                            header.col(|ui| {
                                if sort_button(ui, table, state, NAME_COLUMN) {
                                    clicked = Some(NAME_COLUMN);
                                }
                            });
                        })
                        .body(|mut body| {
                            for &r in &rows {
                                body.row(ROW_HEIGHT, |mut row| {
                                    row.col(|ui| {
                                        ui.strong(&table.rows[r].column);
                                    });
                                });
                            }
                        });

                    if columns.is_empty() {
                        return;
                    }
                    ui.separator();

                    egui::ScrollArea::horizontal()
                        .id_salt("viewer_fields_scroll")
                        .show(ui, |ui| {
                            let mut builder = TableBuilder::new(ui)
                                .id_salt("viewer_fields")
                                .striped(true)
                                .resizable(true)
                                .vscroll(false)
                                .cell_layout(egui::Layout::left_to_right(egui::Align::Center));
                            for _ in &columns {
                                builder = builder.column(
                                    Column::initial(160.0).at_least(60.0).clip(true),
                                );
                            }
                            builder
                                .header(HEADER_HEIGHT, |mut header| {
                                    for &c in &columns {
                                        header.col(|ui| {
                                            if sort_button(ui, table, state, c) {
                                                clicked = Some(c);
                                            }
                                        });
                                    }
                                })
                                .body(|mut body| {
                                    for &r in &rows {
                                        let data = &table.rows[r];
                                        body.row(ROW_HEIGHT, |mut row| {
                                            for &c in &columns {
                                                row.col(|ui| match data.cell(c) {
                                                    Some(text) => {
                                                        ui.label(text);
                                                    }
                                                    None => {
                                                        ui.weak(MISSING);
                                                    }
                                                });
                                            }
                                        });
                                    }
                                });
                        });
                });
            });

        if let Some(column) = clicked {
            self.state.toggle_sort(column);
        }
    }
}

/// Header cell that sorts on click. Returns whether it was clicked.
fn sort_button(
    ui: &mut egui::Ui,
    table: &SummaryTable,
    state: &ViewerState,
    column: usize,
) -> bool {
    let indicator = match state.sort {
        Some(SortKey { column: c, order }) if c == column => match order {
            SortOrder::Ascending => " ⏶",
            SortOrder::Descending => " ⏷",
        },
        _ => "",
    };
    let label = egui::RichText::new(format!("{}{indicator}", table.header[column])).strong();
    ui.add(egui::Button::new(label).frame(false)).clicked()
}

impl eframe::App for MetadataViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("viewer_toolbar").show(ctx, |ui| {
            ui.add_space(4.0);
            self.render_toolbar(ui);
            ui.add_space(4.0);
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_tables(ui);
        });
    }
}

/// Opens a window showing `table` and blocks until it is closed.
///
/// # Errors
///
/// Fails if no native window can be created.
pub fn render_interactive_view(title: &str, table: SummaryTable) -> anyhow::Result<()> {
    tracing::info!("Opening metadata viewer for {} columns", table.rows.len());
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title)
            .with_inner_size([900.0, 600.0])
            .with_min_inner_size([400.0, 300.0]),
        ..Default::default()
    };
    eframe::run_native(
        title,
        options,
        Box::new(move |_cc| Ok(Box::new(MetadataViewer::new(table)))),
    )
    .map_err(|e| anyhow::anyhow!("Metadata viewer failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ValueClass;
    use crate::metadata::SummaryRow;

    fn table() -> SummaryTable {
        let row = |column: &str, class, desc: Option<&str>| SummaryRow {
            column: column.to_owned(),
            class,
            values: vec![desc.map(str::to_owned)],
        };
        SummaryTable {
            header: vec!["Column".to_owned(), "Class".to_owned(), "Description".to_owned()],
            rows: vec![
                row("mpg", ValueClass::Numeric, Some("Miles per gallon")),
                row("cyl", ValueClass::Integer, None),
                row("wt", ValueClass::Numeric, Some("Weight")),
            ],
        }
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let state = ViewerState {
            search: "GALLON".to_owned(),
            ..Default::default()
        };
        assert_eq!(state.visible_rows(&table()), [0]);

        let state = ViewerState {
            search: "integer".to_owned(),
            ..Default::default()
        };
        assert_eq!(state.visible_rows(&table()), [1]);
    }

    #[test]
    fn test_sort_puts_missing_last() {
        let mut state = ViewerState::default();
        state.toggle_sort(2);
        assert_eq!(state.visible_rows(&table()), [0, 2, 1]);
        state.toggle_sort(2);
        assert_eq!(state.sort.map(|k| k.order), Some(SortOrder::Descending));
        assert_eq!(state.visible_rows(&table()), [2, 0, 1]);
    }

    #[test]
    fn test_sort_by_name() {
        let mut state = ViewerState::default();
        state.toggle_sort(NAME_COLUMN);
        assert_eq!(state.visible_rows(&table()), [1, 0, 2]);
    }

    #[test]
    fn test_class_toggle() {
        let mut state = ViewerState::default();
        assert_eq!(state.visible_columns(&table()), [CLASS_COLUMN, 2]);
        state.show_class = false;
        assert_eq!(state.visible_columns(&table()), [2]);
    }
}
