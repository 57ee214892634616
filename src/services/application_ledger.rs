//! 投递记录 - 业务能力层
//!
//! 每次投递尝试追加一行，文件没有表头：
//! `timestamp, external_id, title, company, attempted, submitted`

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{ApplicationRecord, TIMESTAMP_FORMAT};

pub struct ApplicationLedger {
    path: PathBuf,
}

impl ApplicationLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加一条记录
    pub fn append(&self, record: &ApplicationRecord) -> AppResult<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::file_write_failed(self.path.display().to_string(), e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer
            .serialize(record)
            .map_err(|e| AppError::csv_failed(self.path.display().to_string(), e))?;
        writer
            .flush()
            .map_err(|e| AppError::file_write_failed(self.path.display().to_string(), e))?;

        debug!("已写入投递记录: {}", record.external_id);
        Ok(())
    }

    /// 读取全部可解析的记录；文件不存在时为空
    pub fn read_all(&self) -> AppResult<Vec<ApplicationRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| AppError::csv_failed(self.path.display().to_string(), e))?;

        let mut records = Vec::new();
        for (line, row) in reader.records().enumerate() {
            let row = row.map_err(|e| AppError::csv_failed(self.path.display().to_string(), e))?;
            match parse_row(&row) {
                Some(record) => records.push(record),
                None => warn!("跳过无法解析的投递记录 (第 {} 行)", line + 1),
            }
        }
        Ok(records)
    }

    /// 去重窗口内已投递过的职位 ID
    pub fn recent_ids(&self, window_days: i64, now: NaiveDateTime) -> AppResult<HashSet<String>> {
        let cutoff = now - Duration::days(window_days);
        let ids: HashSet<String> = self
            .read_all()?
            .into_iter()
            .filter(|r| r.timestamp > cutoff)
            .map(|r| r.external_id)
            .collect();
        info!("{} 天内已投递过 {} 个职位", window_days, ids.len());
        Ok(ids)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_row(row: &csv::StringRecord) -> Option<ApplicationRecord> {
    let timestamp = NaiveDateTime::parse_from_str(row.get(0)?.trim(), TIMESTAMP_FORMAT).ok()?;
    Some(ApplicationRecord {
        timestamp,
        external_id: row.get(1)?.trim().to_string(),
        title: row.get(2).unwrap_or_default().to_string(),
        company: row.get(3).unwrap_or_default().to_string(),
        attempted: row.get(4).and_then(parse_bool).unwrap_or(false),
        submitted: row.get(5).and_then(parse_bool).unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobCandidate;

    fn at(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).unwrap()
    }

    #[test]
    fn test_append_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ApplicationLedger::new(dir.path().join("output.csv"));
        let candidate = JobCandidate::new("42", "Data Analyst, BI", "Acme", 70);

        let mut record = ApplicationRecord::new(&candidate, true, true);
        record.timestamp = at("2024-03-01 10:00:00");
        ledger.append(&record).unwrap();
        ledger.append(&record).unwrap();

        let content = std::fs::read_to_string(ledger.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "2024-03-01 10:00:00,42,\"Data Analyst, BI\",Acme,true,true");

        let records = ledger.read_all().unwrap();
        assert_eq!(records[0], record);
    }

    #[test]
    fn test_recent_ids_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");
        std::fs::write(
            &path,
            "2024-03-01 10:00:00,old,T,C,True,False\n\
             2024-03-09 10:00:00,recent,T,C,True,True\n\
             garbage line\n",
        )
        .unwrap();

        let ledger = ApplicationLedger::new(&path);
        let ids = ledger.recent_ids(2, at("2024-03-10 09:00:00")).unwrap();
        assert!(ids.contains("recent"));
        assert!(!ids.contains("old"));
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_missing_ledger_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ApplicationLedger::new(dir.path().join("absent.csv"));
        assert!(ledger.recent_ids(2, at("2024-03-10 09:00:00")).unwrap().is_empty());
    }
}
