// 🗓️ Semester - Curriculum-defined term grouping of courses

use crate::entities::attempt::Outcome;
use crate::entities::course::CourseInstance;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Semester {
    number: u32,
    courses: Vec<CourseInstance>,

    /// code → position in `courses`
    index: HashMap<String, usize>,
}

impl Semester {
    pub fn new(number: u32) -> Self {
        Semester {
            number,
            courses: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add a course; a second course with the same code replaces the first
    pub fn add_course(&mut self, course: CourseInstance) {
        match self.index.get(course.code()) {
            Some(&i) => self.courses[i] = course,
            None => {
                self.index.insert(course.code().to_string(), self.courses.len());
                self.courses.push(course);
            }
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn courses(&self) -> &[CourseInstance] {
        &self.courses
    }

    pub(crate) fn courses_mut(&mut self) -> impl Iterator<Item = &mut CourseInstance> {
        self.courses.iter_mut()
    }

    pub fn has_course(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    pub fn course(&self, code: &str) -> Option<&CourseInstance> {
        self.index.get(code).map(|&i| &self.courses[i])
    }

    pub(crate) fn course_mut(&mut self, code: &str) -> Option<&mut CourseInstance> {
        self.index.get(code).map(|&i| &mut self.courses[i])
    }

    /// Course codes, sorted
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.courses.iter().map(|c| c.code()).collect();
        codes.sort_unstable();
        codes
    }

    // ========================================================================
    // AGGREGATES
    // ========================================================================

    /// Codes whose canonical status is approved-class
    pub fn approved_codes(&self) -> Vec<String> {
        self.codes_where(|c| c.is_approved())
    }

    /// Codes whose canonical status is exactly `outcome`
    pub fn codes_with_outcome(&self, outcome: Outcome) -> Vec<String> {
        self.codes_where(|c| c.resolution().is(outcome))
    }

    fn codes_where<F>(&self, predicate: F) -> Vec<String>
    where
        F: Fn(&CourseInstance) -> bool,
    {
        self.courses
            .iter()
            .filter(|c| predicate(c))
            .map(|c| c.code().to_string())
            .collect()
    }

    pub fn total_credits(&self) -> u32 {
        self.courses.iter().map(|c| c.credits()).sum()
    }

    pub fn approved_credits(&self) -> u32 {
        self.courses
            .iter()
            .filter(|c| c.is_approved())
            .map(|c| c.credits())
            .sum()
    }

    /// Every course approved (vacuously true for an empty semester)
    pub fn is_complete(&self) -> bool {
        self.courses.iter().all(|c| c.is_approved())
    }

    /// Longest attempt history in this semester (sizes report tables)
    pub fn max_history_len(&self) -> usize {
        self.courses.iter().map(|c| c.attempts().len()).max().unwrap_or(0)
    }

    pub fn max_prerequisites(&self) -> usize {
        self.courses.iter().map(|c| c.prerequisites().len()).max().unwrap_or(0)
    }

    pub fn max_corequisites(&self) -> usize {
        self.courses.iter().map(|c| c.corequisites().len()).max().unwrap_or(0)
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Semester {:2}", self.number)
    }
}

// ============================================================================
// TESTS
// ============================================================================
