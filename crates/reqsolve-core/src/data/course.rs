//! Course instances - one transcript row each.

use std::cmp::Ordering;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::clause::{Clausable, ClauseKey};
use crate::value::Value;

/// A recorded grade: the letter, its numeric points, and whether it counts
/// toward GPA (audit grades and pass/fail grades do not).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grade {
    pub letter: String,
    pub points: Decimal,
    pub counts_in_gpa: bool,
}

impl Grade {
    pub fn new(letter: impl Into<String>, points: Decimal, counts_in_gpa: bool) -> Self {
        Grade {
            letter: letter.into(),
            points,
            counts_in_gpa,
        }
    }

    /// A letter grade on the standard 4.0 scale.
    pub fn letter(letter: &str) -> Self {
        let points = match letter {
            "A" => Decimal::new(400, 2),
            "A-" => Decimal::new(367, 2),
            "B+" => Decimal::new(333, 2),
            "B" => Decimal::new(300, 2),
            "B-" => Decimal::new(267, 2),
            "C+" => Decimal::new(233, 2),
            "C" => Decimal::new(200, 2),
            "C-" => Decimal::new(167, 2),
            "D+" => Decimal::new(133, 2),
            "D" => Decimal::new(100, 2),
            "D-" => Decimal::new(67, 2),
            _ => Decimal::ZERO,
        };
        Grade::new(letter, points, points > Decimal::ZERO || letter == "F")
    }
}

/// One completed or in-progress course on a transcript.
///
/// Identity:
/// - `clbid` identifies this course-line for claim purposes;
/// - `crsid` identifies the course across terms (distinct-course counting,
///   repeat handling).
///
/// Instances are never mutated after load; attribute attachment returns a
/// new copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseInstance {
    pub clbid: String,
    pub crsid: String,
    pub subject: String,
    pub number: String,
    pub section: Option<String>,
    pub credits: Decimal,
    pub grade: Grade,
    pub year: i32,
    pub semester: u8,
    pub attributes: Vec<String>,
    pub is_lab: bool,
    pub is_repeat: bool,
    pub is_in_progress: bool,
    pub is_incomplete: bool,
}

impl CourseInstance {
    /// Creates a course with the given identities and catalog position.
    ///
    /// Defaults: one credit, grade B, fall of year 2000, no attributes, no
    /// flags. Adjust with the `with_*` methods.
    pub fn new(
        clbid: impl Into<String>,
        crsid: impl Into<String>,
        subject: impl Into<String>,
        number: impl Into<String>,
    ) -> Self {
        CourseInstance {
            clbid: clbid.into(),
            crsid: crsid.into(),
            subject: subject.into(),
            number: number.into(),
            section: None,
            credits: Decimal::ONE,
            grade: Grade::letter("B"),
            year: 2000,
            semester: 1,
            attributes: Vec::new(),
            is_lab: false,
            is_repeat: false,
            is_in_progress: false,
            is_incomplete: false,
        }
    }

    pub fn with_credits(mut self, credits: Decimal) -> Self {
        self.credits = credits;
        self
    }

    pub fn with_grade(mut self, grade: Grade) -> Self {
        self.grade = grade;
        self
    }

    pub fn with_term(mut self, year: i32, semester: u8) -> Self {
        self.year = year;
        self.semester = semester;
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_lab(mut self, is_lab: bool) -> Self {
        self.is_lab = is_lab;
        self
    }

    pub fn with_in_progress(mut self, in_progress: bool) -> Self {
        self.is_in_progress = in_progress;
        self
    }

    pub fn with_repeat(mut self, is_repeat: bool) -> Self {
        self.is_repeat = is_repeat;
        self
    }

    /// Returns a copy with the given attributes attached.
    ///
    /// Attributes are assigned externally (by the area specification), so
    /// attachment happens after load and must not mutate the original.
    pub fn attach_attributes<I, S>(&self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut copy = self.clone();
        copy.attributes = attributes.into_iter().map(Into::into).collect();
        copy
    }

    /// The `SUBJ NUM` course code, e.g. `CSCI 251`.
    pub fn course_code(&self) -> String {
        format!("{} {}", self.subject, self.number)
    }

    /// The course level: first digit of the number times 100.
    pub fn level(&self) -> i64 {
        self.number
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .map(|d| d as i64 * 100)
            .unwrap_or(0)
    }

    /// The combined term identifier, e.g. 2009 fall = 20091.
    pub fn term(&self) -> i64 {
        self.year as i64 * 10 + self.semester as i64
    }
}

impl Clausable for CourseInstance {
    fn field(&self, key: ClauseKey) -> Option<Value> {
        match key {
            ClauseKey::Clbid => Some(Value::str(&self.clbid)),
            ClauseKey::Crsid => Some(Value::str(&self.crsid)),
            ClauseKey::Course => Some(Value::Str(self.course_code())),
            ClauseKey::Subject => Some(Value::str(&self.subject)),
            ClauseKey::Number => Some(Value::str(&self.number)),
            ClauseKey::Section => self.section.as_deref().map(Value::from),
            ClauseKey::Level => Some(Value::Int(self.level())),
            ClauseKey::Credits => Some(Value::Decimal(self.credits)),
            ClauseKey::Grade => Some(Value::Decimal(self.grade.points)),
            ClauseKey::GradeLetter => Some(Value::str(&self.grade.letter)),
            ClauseKey::Attributes => Some(Value::str_tuple(self.attributes.clone())),
            ClauseKey::Term => Some(Value::Int(self.term())),
            ClauseKey::Year => Some(Value::Int(self.year as i64)),
            ClauseKey::Semester => Some(Value::Int(self.semester as i64)),
            ClauseKey::IsLab => Some(Value::Bool(self.is_lab)),
            ClauseKey::IsInProgress => Some(Value::Bool(self.is_in_progress)),
            ClauseKey::IsRepeat => Some(Value::Bool(self.is_repeat)),
            ClauseKey::IsIncomplete => Some(Value::Bool(self.is_incomplete)),
            // Area-pointer fields do not apply to courses.
            ClauseKey::Code
            | ClauseKey::Status
            | ClauseKey::Kind
            | ClauseKey::Degree
            | ClauseKey::Name => None,
        }
    }
}

impl Eq for CourseInstance {}

// Deterministic enumeration order: by term, then catalog position, then
// the unique line id as the final tiebreaker.
impl Ord for CourseInstance {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.year, self.semester)
            .cmp(&(other.year, other.semester))
            .then_with(|| self.subject.cmp(&other.subject))
            .then_with(|| self.number.cmp(&other.number))
            .then_with(|| self.clbid.cmp(&other.clbid))
    }
}

impl PartialOrd for CourseInstance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Display is short because it appears in claim conflict logs.
impl fmt::Display for CourseInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.course_code(), self.clbid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::{Clause, Operator};

    fn course(clbid: &str, subject: &str, number: &str) -> CourseInstance {
        CourseInstance::new(clbid, format!("c-{}-{}", subject, number), subject, number)
    }

    #[test]
    fn test_course_code_and_level() {
        let c = course("1", "CSCI", "251");
        assert_eq!(c.course_code(), "CSCI 251");
        assert_eq!(c.level(), 200);
    }

    #[test]
    fn test_field_dispatch() {
        let c = course("1", "CSCI", "251").with_term(2009, 1);
        assert_eq!(c.field(ClauseKey::Subject), Some(Value::str("CSCI")));
        assert_eq!(c.field(ClauseKey::Level), Some(Value::Int(200)));
        assert_eq!(c.field(ClauseKey::Term), Some(Value::Int(20091)));
        assert_eq!(c.field(ClauseKey::Degree), None);
    }

    #[test]
    fn test_clause_application() {
        let c = course("1", "CSCI", "251");
        let clause = Clause::single(ClauseKey::Course, Operator::EqualTo, "CSCI 251");
        assert!(clause.apply(&c));
    }

    #[test]
    fn test_attribute_attachment_copies() {
        let original = course("1", "CSCI", "251");
        let tagged = original.attach_attributes(["WRI"]);
        assert!(original.attributes.is_empty());
        assert_eq!(tagged.attributes, vec!["WRI".to_string()]);
        assert_eq!(tagged.clbid, original.clbid);
    }

    #[test]
    fn test_ordering_is_term_then_catalog() {
        let spring = course("1", "CSCI", "251").with_term(2009, 3);
        let fall = course("2", "ART", "399").with_term(2009, 1);
        assert!(fall < spring);

        let a = course("3", "ART", "101").with_term(2009, 1);
        assert!(a < fall);
    }

    #[test]
    fn test_grade_scale() {
        assert_eq!(Grade::letter("A").points, Decimal::new(400, 2));
        assert_eq!(Grade::letter("C-").points, Decimal::new(167, 2));
        assert!(Grade::letter("F").counts_in_gpa);
        assert!(!Grade::letter("P").counts_in_gpa);
    }
}
