//! Text output formatting with bars and colors.

use pocketbook_core::{
    CategoryTotal, MonthlySeries, SavingsPlan, Transaction, TransactionPage, UserProfile,
};
use pocketbook_store::SessionState;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

// Bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 20,
        }
    }

    /// Set the bar width.
    #[cfg(test)]
    pub fn with_bar_width(mut self, width: usize) -> Self {
        self.bar_width = width;
        self
    }

    /// Formats the whole dashboard held in the session.
    pub fn format_summary(&self, state: &SessionState, year: i32) -> String {
        let mut lines = Vec::new();

        lines.push(self.bold(&format!("Pocketbook Summary {year}")));
        lines.push("─".repeat(50));

        if let Some(user) = &state.user {
            lines.push(self.format_profile(user));
        }

        lines.push(String::new());
        lines.push(self.bold("Monthly expenses"));
        match &state.expenses_per_month {
            Some(series) => lines.push(self.format_series(series)),
            None => lines.push(self.dim("  No data")),
        }

        lines.push(String::new());
        lines.push(self.bold("Top categories"));
        match &state.category_breakdown {
            Some(categories) if !categories.is_empty() => {
                lines.push(self.format_categories(categories));
            }
            Some(_) => lines.push(self.dim("  No expenses yet")),
            None => lines.push(self.dim("  No data")),
        }

        if let Some(plan) = state.user.as_ref().and_then(UserProfile::savings) {
            lines.push(String::new());
            lines.push(self.format_savings(&plan));
        }

        if state.is_rate_limited {
            lines.push(String::new());
            lines.push(self.format_rate_limit(
                state.rate_limit_remaining_at(chrono::Utc::now()),
            ));
        }

        lines.join("\n")
    }

    /// Formats the profile header with the monthly goal line.
    pub fn format_profile(&self, user: &UserProfile) -> String {
        let mut lines = Vec::new();

        let name = user.name().unwrap_or("Unknown");
        match user.email() {
            Some(email) => lines.push(format!("{} <{}>", self.bold(name), self.cyan(email))),
            None => lines.push(self.bold(name)),
        }

        let income = user.income().unwrap_or(0.0);
        let expense = user.expense().unwrap_or(0.0);
        let goal = user.goal().unwrap_or(0.0);
        if income > 0.0 {
            let spent = (expense / income) * 100.0;
            lines.push(format!(
                "Spent:   {} {} of {}",
                self.progress_bar(100.0 - spent),
                self.format_number(expense),
                self.format_number(income)
            ));
            lines.push(format!(
                "Saved:   {}  (goal {})",
                self.format_number(user.current_saved()),
                self.format_number(goal)
            ));
        }
        if expense > goal && goal > 0.0 {
            lines.push(self.yellow("Spending is past your savings goal this month"));
        }
        if expense > income && income > 0.0 {
            lines.push(self.red("Expenses exceed income this month"));
        }

        lines.join("\n")
    }

    /// Formats the twelve-month series as horizontal bars.
    pub fn format_series(&self, series: &MonthlySeries) -> String {
        let peak = series.as_slice().iter().copied().fold(0.0_f64, f64::max);

        series
            .as_slice()
            .iter()
            .zip(MONTH_LABELS)
            .map(|(total, label)| {
                let filled = if peak > 0.0 {
                    self.cells(total / peak * 100.0)
                } else {
                    0
                };
                format!(
                    "  {label} {}{} {}",
                    BAR_FULL.to_string().repeat(filled),
                    BAR_EMPTY.to_string().repeat(self.bar_width - filled),
                    self.format_number(*total)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats the category breakdown with shares.
    pub fn format_categories(&self, categories: &[CategoryTotal]) -> String {
        let total: f64 = categories.iter().map(|c| c.amount).sum();

        categories
            .iter()
            .map(|c| {
                format!(
                    "  {:<20} {:>10} {}",
                    c.category,
                    self.format_number(c.amount),
                    self.dim(&format!("{:.0}%", c.share_of(total)))
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats the savings allocation.
    pub fn format_savings(&self, plan: &SavingsPlan) -> String {
        let mut lines = vec![format!(
            "{} {}",
            self.bold("Savings"),
            self.green(&self.format_number(plan.total()))
        )];
        for (bucket, entries) in &plan.0 {
            for entry in entries {
                lines.push(format!(
                    "  {:<12} {:<16} {}",
                    bucket,
                    entry.method,
                    self.format_number(entry.amount_value())
                ));
            }
        }
        lines.join("\n")
    }

    /// Formats one page of transactions.
    pub fn format_transactions(&self, page: &TransactionPage, page_number: u32) -> String {
        if page.transactions.is_empty() {
            return self.dim("No transactions found");
        }

        let mut lines = vec![format!(
            "{:<12} {:<24} {:<20} {:<16} {:>12}",
            self.bold("Date"),
            self.bold("Id"),
            self.bold("Category"),
            self.bold("Account"),
            self.bold("Amount")
        )];
        lines.extend(page.transactions.iter().map(|t| self.format_transaction(t)));
        lines.push(String::new());
        lines.push(self.dim(&format!(
            "Page {} of {} · net {}",
            page_number.max(1),
            page.pages,
            self.format_signed(page.net())
        )));
        lines.join("\n")
    }

    fn format_transaction(&self, transaction: &Transaction) -> String {
        let date = transaction
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let amount = self.format_signed(transaction.signed_amount());
        format!(
            "{:<12} {:<24} {:<20} {:<16} {:>12}",
            date, transaction.id, transaction.category, transaction.account, amount
        )
    }

    /// Formats the rate-limit notice.
    pub fn format_rate_limit(&self, remaining_secs: u64) -> String {
        if remaining_secs > 0 {
            self.yellow(&format!(
                "Too many requests. Please wait {remaining_secs} seconds before retrying."
            ))
        } else {
            self.green("Rate limit lifted. Refreshing...")
        }
    }

    /// Formats a progress bar for the share still remaining.
    pub fn progress_bar(&self, percent_remaining: f64) -> String {
        let filled = self.cells(percent_remaining);
        let bar = format!(
            "{}{}",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(self.bar_width - filled)
        );
        self.color_for_percent(percent_remaining, &bar)
    }

    /// Filled cells for a percentage, clamped to the bar width.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn cells(&self, percent: f64) -> usize {
        let percent = percent.clamp(0.0, 100.0);
        ((percent / 100.0) * self.bar_width as f64).round() as usize
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn color_for_percent(&self, percent: f64, text: &str) -> String {
        if !self.use_colors {
            return text.to_string();
        }

        if percent < 20.0 {
            self.red(text)
        } else if percent < 50.0 {
            self.yellow(text)
        } else {
            self.green(text)
        }
    }

    fn format_signed(&self, amount: f64) -> String {
        if amount < 0.0 {
            self.red(&format!("-{}", self.format_number(-amount)))
        } else {
            self.green(&format!("+{}", self.format_number(amount)))
        }
    }

    pub(crate) fn format_number(&self, n: f64) -> String {
        let abs = n.abs();
        if abs >= 1_000_000.0 {
            format!("{:.1}M", n / 1_000_000.0)
        } else if abs >= 10_000.0 {
            format!("{:.1}K", n / 1_000.0)
        } else {
            format!("{n:.2}")
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}
