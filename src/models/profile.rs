//! 申请人资料，供启发式问答查询

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplicantProfile {
    pub years_of_experience: u32,
    pub salary: String,
    pub rate: String,
    pub locations: Vec<String>,
    pub phone_number: String,
    pub profile_url: String,
}

impl ApplicantProfile {
    pub fn from_config(config: &Config) -> Self {
        Self {
            years_of_experience: config.years_of_experience,
            salary: config.salary.clone(),
            rate: config.rate.clone(),
            locations: config
                .locations
                .iter()
                .filter(|l| !l.trim().is_empty())
                .cloned()
                .collect(),
            phone_number: config.phone_number.clone(),
            profile_url: config.profile_url.clone(),
        }
    }

    /// 首选地点
    pub fn primary_location(&self) -> Option<&str> {
        self.locations.first().map(|s| s.as_str())
    }
}
