//! 有声书章节列表

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::{PlayerError, Result};

/// 支持的章节文件扩展名
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "wav", "m4a", "aac"];

/// 一本书：有序的章节文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub title: String,
    chapters: Vec<PathBuf>,
}

impl Book {
    /// 扫描目录中的音频文件，按文件名自然序排列
    pub fn scan(dir: &Path) -> Result<Self> {
        let mut chapters = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && is_audio_file(&path) {
                chapters.push(path);
            }
        }

        chapters.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));

        let title = dir
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown")
            .to_string();

        tracing::debug!("scanned {} chapters in {}", chapters.len(), dir.display());
        Self::from_paths(title, chapters).map_err(|e| match e {
            PlayerError::NoChapters(_) => PlayerError::NoChapters(dir.display().to_string()),
            other => other,
        })
    }

    /// 使用给定顺序的章节文件
    pub fn from_paths(title: impl Into<String>, chapters: Vec<PathBuf>) -> Result<Self> {
        let title = title.into();
        if chapters.is_empty() {
            return Err(PlayerError::NoChapters(title));
        }
        Ok(Self { title, chapters })
    }

    pub fn chapters(&self) -> &[PathBuf] {
        &self.chapters
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// 章节显示名（文件名去扩展名）
    pub fn chapter_title(&self, index: usize) -> Option<String> {
        self.chapters.get(index).map(|path| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Unknown")
                .to_string()
        })
    }
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            AUDIO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// 数字段按数值比较，使 "2.mp3" 排在 "10.mp3" 之前
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();

    loop {
        match (a_chars.peek().copied(), b_chars.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let na = take_number(&mut a_chars);
                let nb = take_number(&mut b_chars);
                match na.cmp(&nb) {
                    Ordering::Equal => {}
                    other => return other,
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                a_chars.next();
                b_chars.next();
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> u64 {
    let mut value: u64 = 0;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        value = value.saturating_mul(10).saturating_add(digit as u64);
        chars.next();
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_order() {
        let mut names = vec!["10.mp3", "2.mp3", "1.mp3", "chapter 3.mp3", "Chapter 20.mp3"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(
            names,
            vec!["1.mp3", "2.mp3", "10.mp3", "chapter 3.mp3", "Chapter 20.mp3"]
        );
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["02.mp3", "01.MP3", "notes.txt", "10.flac"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("extra.mp3")).unwrap();

        let book = Book::scan(dir.path()).unwrap();
        let names: Vec<_> = book.chapters().iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["01.MP3", "02.mp3", "10.flac"]);
        assert_eq!(book.chapter_title(2).as_deref(), Some("10"));
        assert_eq!(book.chapter_title(3), None);
    }

    #[test]
    fn test_scan_empty_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Book::scan(dir.path()).unwrap_err();
        assert!(matches!(err, PlayerError::NoChapters(_)));
    }

    #[test]
    fn test_from_paths_keeps_order() {
        let book = Book::from_paths(
            "Harry Potter",
            vec![PathBuf::from("b.mp3"), PathBuf::from("a.mp3")],
        )
        .unwrap();
        assert_eq!(book.len(), 2);
        assert_eq!(book.chapter_title(0).as_deref(), Some("b"));
    }
}
