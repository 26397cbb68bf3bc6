//! File-based class registry.
//! One JSON file per class, human-readable and safe to back up by copying.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use trogiang_core::error::{Result, TroGiangError};
use trogiang_knowledge::slugify;

const INFO_SUFFIX: &str = "_info.json";

/// A topic as shown to students, plus its knowledge-base key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicEntry {
    /// Display name entered by the teacher.
    pub name: String,
    /// Storage key of the topic's knowledge base.
    pub file: String,
}

/// Registry record for one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub class_code: String,
    #[serde(default)]
    pub students: Vec<String>,
    #[serde(default)]
    pub topics: Vec<TopicEntry>,
}

impl ClassInfo {
    pub fn new(class_code: &str) -> Self {
        Self {
            class_code: class_code.to_string(),
            students: Vec::new(),
            topics: Vec::new(),
        }
    }

    /// Find a topic by display name or storage key.
    pub fn find_topic(&self, name_or_key: &str) -> Option<&TopicEntry> {
        let key = slugify(name_or_key);
        self.topics
            .iter()
            .find(|t| t.name == name_or_key)
            .or_else(|| self.topics.iter().find(|t| t.file == key))
    }
}

/// Class registry rooted at a directory.
pub struct ClassRegistry {
    dir: PathBuf,
}

impl ClassRegistry {
    /// Create a registry at the given directory.
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn info_path(&self, class_key: &str) -> PathBuf {
        self.dir.join(format!("{class_key}{INFO_SUFFIX}"))
    }

    /// Create a new class; the stored code is the slug of `raw_code`.
    pub fn create_class(&self, raw_code: &str) -> Result<ClassInfo> {
        if raw_code.trim().is_empty() {
            return Err(TroGiangError::Input("class code is empty".into()));
        }
        let code = slugify(raw_code);
        if self.info_path(&code).exists() {
            return Err(TroGiangError::ClassExists(code));
        }

        let info = ClassInfo::new(&code);
        self.write(&info)?;
        tracing::info!("🏫 Created class {code}");
        Ok(info)
    }

    /// All class codes, sorted.
    pub fn list_classes(&self) -> Result<Vec<String>> {
        let mut codes: Vec<String> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("⚠️ Skipping unreadable entry in {}: {e}", self.dir.display());
                    None
                }
            })
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|name| name.strip_suffix(INFO_SUFFIX))
                    .map(String::from)
            })
            .collect();
        codes.sort();
        Ok(codes)
    }

    /// Load a class record; `Ok(None)` if the class does not exist.
    pub fn get(&self, class_code: &str) -> Result<Option<ClassInfo>> {
        let path = self.info_path(&slugify(class_code));
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)
            .map_err(|e| TroGiangError::Storage(format!("read {}: {e}", path.display())))?;
        let info = serde_json::from_str(&json)
            .map_err(|e| TroGiangError::Storage(format!("parse {}: {e}", path.display())))?;
        Ok(Some(info))
    }

    /// Like [`Self::get`], but a missing class is an error.
    pub fn require(&self, class_code: &str) -> Result<ClassInfo> {
        self.get(class_code)?
            .ok_or_else(|| TroGiangError::ClassNotFound(slugify(class_code)))
    }

    /// Add a student. Returns `false` if the name is already enrolled.
    pub fn add_student(&self, class_code: &str, student: &str) -> Result<bool> {
        let student = student.trim();
        if student.is_empty() {
            return Err(TroGiangError::Input("student name is empty".into()));
        }
        let mut info = self.require(class_code)?;
        if info.students.iter().any(|s| s == student) {
            return Ok(false);
        }
        info.students.push(student.to_string());
        self.write(&info)?;
        Ok(true)
    }

    /// Check that a topic name is free in `info`; returns its storage key.
    pub fn check_topic_available(info: &ClassInfo, display_name: &str) -> Result<String> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(TroGiangError::Input("topic name is empty".into()));
        }
        let key = slugify(display_name);
        if info.topics.iter().any(|t| t.file == key || t.name == display_name) {
            return Err(TroGiangError::TopicExists(display_name.to_string()));
        }
        Ok(key)
    }

    /// Record a new topic for the class.
    pub fn add_topic(&self, class_code: &str, display_name: &str) -> Result<TopicEntry> {
        let mut info = self.require(class_code)?;
        let key = Self::check_topic_available(&info, display_name)?;
        let entry = TopicEntry {
            name: display_name.trim().to_string(),
            file: key,
        };
        info.topics.push(entry.clone());
        self.write(&info)?;
        Ok(entry)
    }

    /// Write via a temp file and rename, so readers never see partial JSON.
    fn write(&self, info: &ClassInfo) -> Result<()> {
        let path = self.info_path(&info.class_code);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(info)?;
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        tracing::debug!("💾 Saved class {} to {}", info.class_code, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(name: &str) -> (ClassRegistry, PathBuf) {
        let dir = std::env::temp_dir().join(format!("trogiang-registry-{name}"));
        std::fs::remove_dir_all(&dir).ok();
        (ClassRegistry::new(&dir).unwrap(), dir)
    }

    #[test]
    fn test_create_and_list() {
        let (reg, dir) = registry("create");
        let info = reg.create_class("Lớp 10A1").unwrap();
        assert_eq!(info.class_code, "Lớp_10A1");
        reg.create_class("9B").unwrap();

        assert_eq!(reg.list_classes().unwrap(), vec!["9B", "Lớp_10A1"]);
        assert!(matches!(reg.create_class("Lớp  10A1"), Err(TroGiangError::ClassExists(_))));
        assert!(matches!(reg.create_class("  "), Err(TroGiangError::Input(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_students() {
        let (reg, dir) = registry("students");
        reg.create_class("10A1").unwrap();
        assert!(reg.add_student("10A1", "Nguyễn Văn An").unwrap());
        assert!(!reg.add_student("10A1", "Nguyễn Văn An").unwrap());
        assert!(matches!(reg.add_student("10A1", " "), Err(TroGiangError::Input(_))));
        assert!(matches!(
            reg.add_student("missing", "An"),
            Err(TroGiangError::ClassNotFound(_))
        ));
        assert_eq!(reg.require("10A1").unwrap().students, vec!["Nguyễn Văn An"]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_topics_are_unique_by_name_and_key() {
        let (reg, dir) = registry("topics");
        reg.create_class("10A1").unwrap();
        let entry = reg.add_topic("10A1", "Tế bào học").unwrap();
        assert_eq!(entry.file, "Tế_bào_học");

        assert!(matches!(reg.add_topic("10A1", "Tế bào học"), Err(TroGiangError::TopicExists(_))));
        assert!(matches!(reg.add_topic("10A1", "Tế bào/học"), Err(TroGiangError::TopicExists(_))));

        let info = reg.require("10A1").unwrap();
        assert_eq!(info.find_topic("Tế bào học").unwrap().file, "Tế_bào_học");
        assert_eq!(info.find_topic("Tế_bào_học").unwrap().name, "Tế bào học");
        assert!(info.find_topic("Hóa").is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reads_legacy_json_without_optional_fields() {
        let (reg, dir) = registry("legacy");
        std::fs::write(dir.join("11C2_info.json"), r#"{"class_code": "11C2"}"#).unwrap();
        let info = reg.get("11C2").unwrap().unwrap();
        assert!(info.students.is_empty() && info.topics.is_empty());
        assert!(reg.get("nope").unwrap().is_none());
        std::fs::remove_dir_all(&dir).ok();
    }
}
