// 入力値の検証
// フィールドごとの規則を宣言的なテーブルとして定義し、コアを呼び出す前に評価する

use crate::domain::model::{BookDetails, CoverImageUrl, Email, Isbn, Member};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// フィールドに適用する規則
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// 値が存在し、空白のみでない
    Required,
    MaxLength(usize),
    MinLength(usize),
    /// 指定桁数の数字のみ
    Digits(usize),
    Email,
    /// http(s)の画像URL
    ImageUrl,
    MinValue(i64),
    /// `YYYY-MM-DD` 形式の日付（年は4桁）
    Date,
    Uuid,
    /// 指定したフィールドと同じ値
    Confirmed(&'static str),
}

/// 規則テーブル: (フィールド名, 規則の並び)
pub type RuleTable = &'static [(&'static str, &'static [FieldRule])];

pub const BOOK_RULES: RuleTable = &[
    (
        "title",
        &[FieldRule::Required, FieldRule::MaxLength(BookDetails::MAX_TEXT_LENGTH)],
    ),
    (
        "author",
        &[FieldRule::Required, FieldRule::MaxLength(BookDetails::MAX_TEXT_LENGTH)],
    ),
    ("isbn", &[FieldRule::Required, FieldRule::Digits(Isbn::LENGTH)]),
    (
        "description",
        &[
            FieldRule::Required,
            FieldRule::MinLength(BookDetails::MIN_DESCRIPTION_LENGTH),
        ],
    ),
    (
        "cover_image",
        &[
            FieldRule::MaxLength(CoverImageUrl::MAX_LENGTH),
            FieldRule::ImageUrl,
        ],
    ),
    ("quantity", &[FieldRule::Required, FieldRule::MinValue(1)]),
];

pub const REGISTER_RULES: RuleTable = &[
    (
        "name",
        &[FieldRule::Required, FieldRule::MaxLength(Member::MAX_NAME_LENGTH)],
    ),
    (
        "email",
        &[FieldRule::Required, FieldRule::MaxLength(255), FieldRule::Email],
    ),
    (
        "password",
        &[
            FieldRule::Required,
            FieldRule::MinLength(8),
            FieldRule::Confirmed("password_confirmation"),
        ],
    ),
];

pub const PASSWORD_RULES: RuleTable = &[
    ("current_password", &[FieldRule::Required]),
    (
        "password",
        &[
            FieldRule::Required,
            FieldRule::MinLength(8),
            FieldRule::Confirmed("password_confirmation"),
        ],
    ),
];

pub const BORROWING_RULES: RuleTable = &[
    ("member_id", &[FieldRule::Required, FieldRule::Uuid]),
    ("book_id", &[FieldRule::Required, FieldRule::Uuid]),
    ("borrow_date", &[FieldRule::Required, FieldRule::Date]),
];

/// 検証対象の値
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Missing,
    Text(&'a str),
    Number(i64),
}

impl<'a> FieldValue<'a> {
    pub fn from_text(value: &'a Option<String>) -> Self {
        match value {
            Some(text) => FieldValue::Text(text),
            None => FieldValue::Missing,
        }
    }

    pub fn from_number(value: Option<i64>) -> Self {
        match value {
            Some(number) => FieldValue::Number(number),
            None => FieldValue::Missing,
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            FieldValue::Missing => true,
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Number(_) => false,
        }
    }
}

/// フィールド名で値を取り出せるリクエスト
pub trait FieldSource {
    fn field(&self, name: &str) -> FieldValue<'_>;
}

/// フィールドごとの検証エラー
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// 指定フィールドのエラーメッセージ
    pub fn messages(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    fn add(&mut self, field: &str, message: String) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message);
    }
}

/// 規則テーブルに従って検証する
/// 必須でないフィールドは値がない場合に他の規則を評価しない
pub fn validate(source: &dyn FieldSource, table: RuleTable) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    for (field, rules) in table {
        let value = source.field(field);
        let label = field.replace('_', " ");

        if value.is_blank() {
            if rules.contains(&FieldRule::Required) {
                errors.add(field, format!("The {} field is required.", label));
            }
            continue;
        }

        for rule in rules.iter() {
            if let Some(message) = check(source, *rule, value, &label) {
                errors.add(field, message);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check(
    source: &dyn FieldSource,
    rule: FieldRule,
    value: FieldValue<'_>,
    label: &str,
) -> Option<String> {
    let text = match value {
        FieldValue::Text(text) => Some(text.trim()),
        _ => None,
    };

    let passed = match (rule, value) {
        (FieldRule::Required, _) => true,
        (FieldRule::MaxLength(max), _) => text.map_or(true, |t| t.chars().count() <= max),
        (FieldRule::MinLength(min), _) => text.map_or(true, |t| t.chars().count() >= min),
        (FieldRule::Digits(len), _) => {
            text.map_or(false, |t| t.len() == len && t.chars().all(|c| c.is_ascii_digit()))
        }
        (FieldRule::Email, _) => text.map_or(false, Email::is_valid),
        (FieldRule::ImageUrl, _) => text.map_or(false, CoverImageUrl::is_valid),
        (FieldRule::MinValue(min), FieldValue::Number(number)) => number >= min,
        (FieldRule::MinValue(_), _) => false,
        (FieldRule::Date, _) => text.map_or(false, is_calendar_date),
        (FieldRule::Uuid, _) => text.map_or(false, |t| Uuid::parse_str(t).is_ok()),
        (FieldRule::Confirmed(other), FieldValue::Text(value)) => {
            source.field(other) == FieldValue::Text(value)
        }
        (FieldRule::Confirmed(_), _) => false,
    };

    if passed {
        return None;
    }

    Some(match rule {
        FieldRule::Required => format!("The {} field is required.", label),
        FieldRule::MaxLength(max) => {
            format!("The {} field must not be greater than {} characters.", label, max)
        }
        FieldRule::MinLength(min) => {
            format!("The {} field must be at least {} characters.", label, min)
        }
        FieldRule::Digits(len) => format!("The {} field must be {} digits.", label, len),
        FieldRule::Email => format!("The {} field must be a valid email address.", label),
        FieldRule::ImageUrl => {
            format!("The {} must end with jpg, jpeg, png, gif, or webp.", label)
        }
        FieldRule::MinValue(min) => format!("The {} field must be at least {}.", label, min),
        FieldRule::Date => format!("The {} field must be a valid date (YYYY-MM-DD).", label),
        FieldRule::Uuid => format!("The {} field must be a valid UUID.", label),
        FieldRule::Confirmed(_) => format!("The {} field confirmation does not match.", label),
    })
}

/// 4桁の年を持つ `YYYY-MM-DD` で、実在する日付か
fn is_calendar_date(text: &str) -> bool {
    let bytes = text.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    shaped && NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
}
