//! Control Panel Widget
//! Left side panel with the trip filters, export button and load status.

use crate::data::filter::MAX_HOUR;
use crate::data::{PaymentType, TripFilter, TripTable};
use chrono::{Months, NaiveDate};
use egui::{Color32, ComboBox, RichText};
use std::collections::BTreeSet;

/// Left side control panel holding the filter selections.
pub struct ControlPanel {
    /// Selectable days, ascending. See [`selectable_dates`].
    pub dates: Vec<NaiveDate>,
    pub start_idx: usize,
    pub end_idx: usize,
    pub hour_start: u32,
    pub hour_end: u32,
    /// Payment types present in the table, with their checkbox state.
    pub payments: Vec<(PaymentType, bool)>,
    pub progress: f32,
    pub status: String,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            dates: Vec::new(),
            start_idx: 0,
            end_idx: 0,
            hour_start: 0,
            hour_end: MAX_HOUR,
            payments: Vec::new(),
            progress: 0.0,
            status: "Ready".to_string(),
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the selections to cover the whole table. `month` is the first day
    /// of the dataset month, when known.
    pub fn set_table(&mut self, table: &TripTable, month: Option<NaiveDate>) {
        self.dates = selectable_dates(table.date_bounds(), month);
        self.start_idx = 0;
        self.end_idx = self.dates.len().saturating_sub(1);
        self.hour_start = 0;
        self.hour_end = MAX_HOUR;
        self.payments = table
            .payment_types()
            .into_iter()
            .map(|p| (p, true))
            .collect();
    }

    /// Current selections as a filter. `None` until a table is loaded.
    pub fn filter(&self) -> Option<TripFilter> {
        let start_date = *self.dates.get(self.start_idx)?;
        let end_date = *self.dates.get(self.end_idx)?;
        Some(TripFilter {
            start_date,
            end_date,
            hour_start: self.hour_start,
            hour_end: self.hour_end,
            payments: self
                .payments
                .iter()
                .filter(|(_, on)| *on)
                .map(|(p, _)| *p)
                .collect(),
        })
    }

    /// Draw the control panel
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        can_export: bool,
        is_loading: bool,
    ) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;
        let before = self.filter();

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🚕 Filters")
                    .size(22.0)
                    .color(Color32::from_rgb(244, 165, 34)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        ui.add_enabled_ui(!self.dates.is_empty(), |ui| {
            // ===== Date Range =====
            ui.label(RichText::new("📅 Date Range").size(14.0).strong());
            ui.add_space(5.0);

            let label_width = 60.0;
            let combo_width = 150.0;
            self.date_combo(ui, "start_date", "From:", label_width, combo_width, true);
            ui.add_space(5.0);
            self.date_combo(ui, "end_date", "To:", label_width, combo_width, false);

            ui.add_space(15.0);
            ui.separator();
            ui.add_space(10.0);

            // ===== Hour Range =====
            ui.label(RichText::new("🕒 Pickup Hour Range").size(14.0).strong());
            ui.add_space(5.0);
            ui.add(egui::Slider::new(&mut self.hour_start, 0..=MAX_HOUR).text("from"));
            ui.add(egui::Slider::new(&mut self.hour_end, 0..=MAX_HOUR).text("to"));

            ui.add_space(15.0);
            ui.separator();
            ui.add_space(10.0);

            // ===== Payment Type =====
            ui.label(RichText::new("💳 Payment Type").size(14.0).strong());
            ui.add_space(5.0);
            egui::Frame::none()
                .fill(ui.visuals().widgets.noninteractive.bg_fill)
                .rounding(5.0)
                .inner_margin(5.0)
                .show(ui, |ui| {
                    for (payment, on) in self.payments.iter_mut() {
                        ui.checkbox(on, payment.label());
                    }
                });

            ui.add_space(5.0);
            ui.horizontal(|ui| {
                if ui.small_button("Select All").clicked() {
                    self.payments.iter_mut().for_each(|(_, on)| *on = true);
                }
                if ui.small_button("Clear All").clicked() {
                    self.payments.iter_mut().for_each(|(_, on)| *on = false);
                }
            });
            if self.payments.iter().all(|(_, on)| !on) {
                ui.label(
                    RichText::new("No payment type selected: showing all")
                        .size(11.0)
                        .color(Color32::GRAY),
                );
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(can_export, |ui| {
                let button = egui::Button::new(RichText::new("📄 Export Charts").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportCharts;
                }
            });

            ui.add_space(8.0);

            ui.add_enabled_ui(!is_loading, |ui| {
                if ui.button("🔄 Reload Data").clicked() {
                    action = ControlPanelAction::Reload;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Status").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(is_loading),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Loaded") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        if action == ControlPanelAction::None && self.filter() != before {
            action = ControlPanelAction::FilterChanged;
        }
        action
    }

    fn date_combo(
        &mut self,
        ui: &mut egui::Ui,
        id: &str,
        label: &str,
        label_width: f32,
        combo_width: f32,
        is_start: bool,
    ) {
        let selected = if is_start { self.start_idx } else { self.end_idx };
        let selected_text = self
            .dates
            .get(selected)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new(label));
            ComboBox::from_id_salt(id)
                .width(combo_width)
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    for (i, date) in self.dates.iter().enumerate() {
                        let text = date.format("%a %Y-%m-%d").to_string();
                        if ui.selectable_label(i == selected, text).clicked() {
                            if is_start {
                                self.start_idx = i;
                            } else {
                                self.end_idx = i;
                            }
                        }
                    }
                });
        });
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Days offered by the date combos: the first and last pickup dates plus every
/// day of `month` between them. Without a month, every day between the bounds.
fn selectable_dates(
    bounds: Option<(NaiveDate, NaiveDate)>,
    month: Option<NaiveDate>,
) -> Vec<NaiveDate> {
    let Some((first, last)) = bounds else {
        return Vec::new();
    };
    let month_end = month.and_then(|m| m.checked_add_months(Months::new(1))?.pred_opt());
    let (from, to) = match (month, month_end) {
        (Some(start), Some(end)) => (start.max(first), end.min(last)),
        _ => (first, last),
    };

    let mut dates: BTreeSet<NaiveDate> = from.iter_days().take_while(|d| *d <= to).collect();
    dates.insert(first);
    dates.insert(last);
    dates.into_iter().collect()
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    FilterChanged,
    ExportCharts,
    Reload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::records::tests::record;

    #[test]
    fn panel_defaults_cover_the_table() {
        let table = TripTable::new(vec![
            record("2024-01-03T10:00:00", PaymentType::Cash, None),
            record("2024-01-01T08:00:00", PaymentType::CreditCard, None),
        ]);
        let mut panel = ControlPanel::new();
        assert!(panel.filter().is_none());

        panel.set_table(&table, None);
        assert_eq!(panel.dates.len(), 3);
        assert_eq!(panel.filter(), Some(TripFilter::all_of(&table)));

        panel.payments.iter_mut().for_each(|(_, on)| *on = false);
        let filter = panel.filter().unwrap();
        assert!(filter.payments.is_empty());
        assert_eq!(filter.apply(&table).len(), 2);
    }

    #[test]
    fn outlier_dates_do_not_widen_the_day_list() {
        let table = TripTable::new(vec![
            record("2024-01-02T10:00:00", PaymentType::Cash, None),
            record("2002-12-31T23:00:00", PaymentType::Cash, None),
            record("2024-01-09T08:00:00", PaymentType::CreditCard, None),
            record("2024-02-01T00:30:00", PaymentType::Cash, None),
        ]);
        let day = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let mut panel = ControlPanel::new();
        panel.set_table(&table, Some(day(2024, 1, 1)));

        assert_eq!(panel.dates.len(), 33);
        assert_eq!(panel.dates[0], day(2002, 12, 31));
        assert_eq!(panel.dates[1], day(2024, 1, 1));
        assert_eq!(panel.dates[31], day(2024, 1, 31));
        assert_eq!(panel.dates[32], day(2024, 2, 1));
        assert_eq!(panel.filter(), Some(TripFilter::all_of(&table)));
    }

    #[test]
    fn month_days_are_clamped_to_the_table() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let dates = selectable_dates(Some((day(5), day(7))), Some(day(1)));
        assert_eq!(dates, vec![day(5), day(6), day(7)]);
        assert!(selectable_dates(None, Some(day(1))).is_empty());
    }
}
