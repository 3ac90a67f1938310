//! User-facing strings. Only the wording lives here; bucket boundaries and
//! numbers are decided by [`crate::time`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ko,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en_us" => Ok(Locale::En),
            "ko" | "ko-kr" | "ko_kr" => Ok(Locale::Ko),
            other => Err(format!("unsupported locale {other:?}")),
        }
    }
}

fn plural(n: i64, one: &str, many: &str) -> String {
    if n == 1 {
        format!("1 {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Qualifier date-fns puts in front of a year count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearQualifier {
    About,
    Over,
    Almost,
}

impl Locale {
    pub fn just_now(self) -> String {
        match self {
            Locale::En => "just now".to_string(),
            Locale::Ko => "방금 전".to_string(),
        }
    }

    pub fn minutes_ago(self, n: i64) -> String {
        match self {
            Locale::En => format!("{} ago", plural(n, "minute", "minutes")),
            Locale::Ko => format!("{n}분 전"),
        }
    }

    pub fn hours_ago(self, n: i64) -> String {
        match self {
            Locale::En => format!("{} ago", plural(n, "hour", "hours")),
            Locale::Ko => format!("{n}시간 전"),
        }
    }

    pub fn days_ago(self, n: i64) -> String {
        match self {
            Locale::En => format!("{} ago", plural(n, "day", "days")),
            Locale::Ko => format!("{n}일 전"),
        }
    }

    pub fn about_months_ago(self, n: i64) -> String {
        match self {
            Locale::En => format!("about {} ago", plural(n, "month", "months")),
            Locale::Ko => format!("약 {n}개월 전"),
        }
    }

    pub fn months_ago(self, n: i64) -> String {
        match self {
            Locale::En => format!("{} ago", plural(n, "month", "months")),
            Locale::Ko => format!("{n}개월 전"),
        }
    }

    pub fn years_ago(self, qualifier: YearQualifier, n: i64) -> String {
        match (self, qualifier) {
            (Locale::En, YearQualifier::About) => format!("about {} ago", plural(n, "year", "years")),
            (Locale::En, YearQualifier::Over) => format!("over {} ago", plural(n, "year", "years")),
            (Locale::En, YearQualifier::Almost) => format!("almost {} ago", plural(n, "year", "years")),
            (Locale::Ko, YearQualifier::About) => format!("약 {n}년 전"),
            (Locale::Ko, YearQualifier::Over) => format!("{n}년 이상 전"),
            (Locale::Ko, YearQualifier::Almost) => format!("거의 {n}년 전"),
        }
    }

    /// Toast text announcing a post from `author_name`.
    pub fn new_post_notice(self, author_name: &str) -> String {
        match self {
            Locale::En => format!("{author_name} published a new post"),
            Locale::Ko => format!("{author_name}님이 새 글을 작성했습니다"),
        }
    }
}
