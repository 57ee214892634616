//! 问题类型识别与默认回答
//!
//! 顺序即优先级：工作年限、薪资、地点、到岗时间必须排在通用是非题之前，
//! 因为它们与是非题共享词汇。

use std::sync::LazyLock;

use regex::Regex;

use crate::models::ApplicantProfile;

/// 按整词匹配，`relocation`、`United States` 不算地点问题
static LOCATION_QUESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(location|city|state)\b|where are you located|based in").expect("静态正则")
});

/// 答案来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reply {
    /// 固定回答
    Canned(&'static str),
    YearsOfExperience,
    Salary,
    /// 未配置时薪时不命中
    HourlyRate,
    /// 无首选地点时不命中，继续匹配后续类别
    PrimaryLocation,
    ProfileUrl,
}

struct Category {
    name: &'static str,
    matches: fn(&str) -> bool,
    reply: Reply,
}

fn any_of(question: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| question.contains(p))
}

static CATEGORIES: &[Category] = &[
    Category {
        name: "experience",
        matches: |q| {
            any_of(
                q,
                &["how many years", "years of experience", "years' experience", "years experience"],
            )
        },
        reply: Reply::YearsOfExperience,
    },
    Category {
        name: "rate",
        matches: |q| any_of(q, &["hourly rate", "rate per hour", "day rate", "daily rate"]),
        reply: Reply::HourlyRate,
    },
    Category {
        name: "salary",
        matches: |q| any_of(q, &["salary", "compensation", "pay expectation", "expected pay"]),
        reply: Reply::Salary,
    },
    Category {
        name: "location",
        matches: |q| LOCATION_QUESTION.is_match(q),
        reply: Reply::PrimaryLocation,
    },
    Category {
        name: "availability",
        matches: |q| {
            any_of(
                q,
                &["when can you start", "availability", "earliest start date", "notice period", "start date"],
            )
        },
        reply: Reply::Canned("I am available to start two weeks after receiving an offer"),
    },
    Category {
        name: "notice",
        matches: |q| any_of(q, &["notice period", "how much notice"]),
        reply: Reply::Canned("2 weeks"),
    },
    Category {
        name: "clearance",
        matches: |q| any_of(q, &["security clearance", "clearance level", "government clearance"]),
        reply: Reply::Canned("No"),
    },
    Category {
        name: "background-check",
        matches: |q| any_of(q, &["drug test", "background check", "criminal background"]),
        reply: Reply::Canned("Yes"),
    },
    Category {
        name: "commute",
        matches: |q| q.contains("commute"),
        reply: Reply::Canned("Yes"),
    },
    Category {
        name: "references",
        matches: |q| q.contains("reference") && (q.contains("provide") || q.contains("have")),
        reply: Reply::Canned("Yes"),
    },
    Category {
        name: "team-size",
        matches: |q| any_of(q, &["team size", "how many people", "manage", "direct reports"]),
        reply: Reply::Canned("5"),
    },
    Category {
        name: "profile-url",
        matches: |q| q.contains("linkedin") && (q.contains("profile") || q.contains("url")),
        reply: Reply::ProfileUrl,
    },
    Category {
        name: "portfolio",
        matches: |q| {
            any_of(q, &["website", "portfolio", "github"]) && (q.contains("url") || q.contains("link"))
        },
        reply: Reply::Canned(""),
    },
    Category {
        name: "essay",
        matches: |q| {
            any_of(
                q,
                &["cover letter", "why do you want", "why are you interested", "tell us about yourself"],
            )
        },
        reply: Reply::Canned(""),
    },
    Category {
        name: "education",
        matches: |q| any_of(q, &["education level", "highest degree", "level of education"]),
        reply: Reply::Canned("Bachelor's Degree"),
    },
    Category {
        name: "gpa",
        matches: |q| q.contains("gpa"),
        reply: Reply::Canned("3.5"),
    },
    Category {
        name: "employment-status",
        matches: |q| any_of(q, &["currently employed", "employment status"]),
        reply: Reply::Canned("Yes"),
    },
];

/// 是非题的疑问句式
pub const YES_NO_PATTERNS: &[&str] = &[
    "are you", "do you", "have you", "will you", "can you", "did you", "would you",
];

/// 出现即回答 "No" 的否定标记
pub const NEGATIVE_MARKERS: &[&str] = &[
    "not authorized",
    "don't have",
    "haven't",
    "cannot",
    "can't",
    "won't",
    "sponsorship",
    "criminal",
    "convicted",
    "felony",
    "disability",
    "disabled",
    "non-compete",
    "non compete",
];

/// 按类别顺序匹配，返回 (类别名, 回答)
pub fn heuristic_answer(question: &str, profile: &ApplicantProfile) -> Option<(&'static str, String)> {
    let lowered = question.to_lowercase();
    CATEGORIES
        .iter()
        .filter(|c| (c.matches)(&lowered))
        .find_map(|c| {
            let answer = match c.reply {
                Reply::Canned(text) => text.to_string(),
                Reply::YearsOfExperience => profile.years_of_experience.to_string(),
                Reply::Salary => profile.salary.clone(),
                Reply::HourlyRate => Some(profile.rate.as_str())
                    .filter(|r| !r.trim().is_empty())?
                    .to_string(),
                Reply::PrimaryLocation => profile.primary_location()?.to_string(),
                Reply::ProfileUrl => profile.profile_url.clone(),
            };
            Some((c.name, answer))
        })
}

/// 通用是非题兜底
pub fn yes_no_answer(question: &str) -> Option<&'static str> {
    let lowered = question.to_lowercase();
    if !YES_NO_PATTERNS.iter().any(|p| lowered.contains(p)) {
        return None;
    }
    if NEGATIVE_MARKERS.iter().any(|m| lowered.contains(m)) {
        Some("No")
    } else {
        Some("Yes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> ApplicantProfile {
        ApplicantProfile {
            years_of_experience: 8,
            salary: "120000".to_string(),
            rate: "65".to_string(),
            locations: vec!["Berlin".to_string()],
            phone_number: String::new(),
            profile_url: "https://www.linkedin.com/in/someone".to_string(),
        }
    }

    #[test]
    fn test_experience_before_yes_no() {
        let q = "How many years of experience do you have?";
        assert_eq!(heuristic_answer(q, &profile()), Some(("experience", "8".to_string())));
    }

    #[test]
    fn test_profile_lookups() {
        assert_eq!(
            heuristic_answer("What are your salary expectations?", &profile()).map(|(_, a)| a),
            Some("120000".to_string())
        );
        assert_eq!(
            heuristic_answer("Where are you located?", &profile()).map(|(_, a)| a),
            Some("Berlin".to_string())
        );
        assert_eq!(
            heuristic_answer("LinkedIn Profile", &profile()).map(|(_, a)| a),
            Some("https://www.linkedin.com/in/someone".to_string())
        );
    }

    #[test]
    fn test_hourly_rate_before_salary() {
        assert_eq!(
            heuristic_answer("What is your expected hourly rate compensation?", &profile()),
            Some(("rate", "65".to_string()))
        );
        let mut p = profile();
        p.rate.clear();
        assert_eq!(
            heuristic_answer("What is your expected hourly rate compensation?", &p),
            Some(("salary", "120000".to_string()))
        );
    }

    #[test]
    fn test_location_without_profile_falls_through() {
        let mut p = profile();
        p.locations.clear();
        assert_eq!(heuristic_answer("Which city are you in?", &p), None);
    }

    #[test]
    fn test_location_matches_whole_words_only() {
        assert_eq!(
            heuristic_answer("Which state do you live in?", &profile()).map(|(_, a)| a),
            Some("Berlin".to_string())
        );
        let q = "Are you legally authorized to work in the United States?";
        assert_eq!(heuristic_answer(q, &profile()), None);
        assert_eq!(yes_no_answer(q), Some("Yes"));
        assert_eq!(heuristic_answer("Are you open to relocation?", &profile()), None);
    }

    #[test]
    fn test_availability_wins_over_notice() {
        let (name, _) = heuristic_answer("What is your notice period?", &profile()).unwrap();
        assert_eq!(name, "availability");
        assert_eq!(
            heuristic_answer("How much notice do you need to give?", &profile()),
            Some(("notice", "2 weeks".to_string()))
        );
    }

    #[test]
    fn test_essay_left_blank() {
        assert_eq!(
            heuristic_answer("Why do you want to work here?", &profile()),
            Some(("essay", String::new()))
        );
    }

    #[test]
    fn test_yes_no_fallback() {
        assert_eq!(yes_no_answer("Do you require visa sponsorship?"), Some("No"));
        assert_eq!(yes_no_answer("Have you ever been convicted of a felony?"), Some("No"));
        assert_eq!(yes_no_answer("Are you comfortable working on-site?"), Some("Yes"));
        assert_eq!(yes_no_answer("Favourite colour"), None);
    }
}
