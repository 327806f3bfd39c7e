//! Shift report extraction.
//!
//! Operators paste a "Summary of Tips and VIPs" message into the chat. Each
//! field is pulled out with a case-insensitive pattern; fields that are absent
//! stay `None` and become empty cells.

use std::{fmt, sync::OnceLock};

use regex::Regex;

use crate::sheets::SheetRow;

struct Patterns {
    name: Regex,
    date_shift: Regex,
    creator: Regex,
    vip_tip: Regex,
    ppv: Regex,
    total_gross_sale: Regex,
    total_net_sale: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        name: Regex::new(r"(?i)Summary of Tips and VIPs for\s*(.*)").expect("valid regex"),
        date_shift: Regex::new(r"(?i)(\w+ \d+, \d+:\s*\d+AM-\d+AM PST)").expect("valid regex"),
        creator: Regex::new(r"(?i)Creator :\s*(.*)").expect("valid regex"),
        vip_tip: Regex::new(r"(?i)\$(\d+) TIP from @\w+").expect("valid regex"),
        ppv: Regex::new(r"(?i)\$(\d+) PPV PAID (from )?@\w+").expect("valid regex"),
        total_gross_sale: Regex::new(r"(?i)TOTAL GROSS SALE:\s*\$\s*(\d+)").expect("valid regex"),
        total_net_sale: Regex::new(r"(?i)TOTAL NET SALE:\s*\$\s*(\d+)").expect("valid regex"),
    })
}

/// Fields extracted from a single shift summary message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShiftReport {
    pub name: Option<String>,
    pub date_shift: Option<String>,
    pub creator: Option<String>,
    /// Tip amounts, comma separated in message order.
    pub vip_tips: Option<String>,
    /// Paid PPV amounts, comma separated in message order.
    pub ppvs: Option<String>,
    pub total_gross_sale: Option<String>,
    pub total_net_sale: Option<String>,
}

impl ShiftReport {
    pub fn extract(text: &str) -> Self {
        let p = patterns();
        Self {
            name: first_group(&p.name, text),
            date_shift: first_group(&p.date_shift, text),
            creator: first_group(&p.creator, text),
            vip_tips: all_groups(&p.vip_tip, text),
            ppvs: all_groups(&p.ppv, text),
            total_gross_sale: first_group(&p.total_gross_sale, text),
            total_net_sale: first_group(&p.total_net_sale, text),
        }
    }

    /// True when nothing at all matched.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.date_shift.is_none()
            && self.creator.is_none()
            && self.vip_tips.is_none()
            && self.ppvs.is_none()
            && self.total_gross_sale.is_none()
            && self.total_net_sale.is_none()
    }

    /// Sheet layout: name, date/shift, shift label, creator, tips, PPVs, gross,
    /// net, net. The net total fills the last two columns.
    pub fn to_row(&self, shift_label: &str) -> SheetRow {
        SheetRow::new(vec![
            self.name.clone(),
            self.date_shift.clone(),
            Some(shift_label.to_string()),
            self.creator.clone(),
            self.vip_tips.clone(),
            self.ppvs.clone(),
            self.total_gross_sale.clone(),
            self.total_net_sale.clone(),
            self.total_net_sale.clone(),
        ])
    }
}

impl fmt::Display for ShiftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show(v: &Option<String>) -> &str {
            v.as_deref().unwrap_or("None")
        }
        write!(
            f,
            "name={}, date_shift={}, creator={}, vip_tips={}, ppvs={}, total_gross_sale={}, total_net_sale={}",
            show(&self.name),
            show(&self.date_shift),
            show(&self.creator),
            show(&self.vip_tips),
            show(&self.ppvs),
            show(&self.total_gross_sale),
            show(&self.total_net_sale),
        )
    }
}

fn first_group(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn all_groups(re: &Regex, text: &str) -> Option<String> {
    let amounts: Vec<&str> = re
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect();
    if amounts.is_empty() {
        None
    } else {
        Some(amounts.join(", "))
    }
}
