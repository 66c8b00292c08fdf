use std::sync::Arc;

use serde::Serialize;

use crate::portal::domain::{
    Book, BookId, Course, CourseId, NewSubject, Subject, SubjectId,
};
use crate::portal::gateway::{GatewayError, PortalGateway};

/// Subject, course, and book maintenance.
///
/// A subject referenced by an approved tutor link is frozen: renames and
/// deletes would silently invalidate the approval, so both are refused.
pub struct CatalogService<G> {
    gateway: Arc<G>,
}

/// Outcome of a bulk subject seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub inserted: usize,
    pub skipped: usize,
}

impl<G> CatalogService<G>
where
    G: PortalGateway + 'static,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub fn add_subject(&self, subject: NewSubject) -> Result<Subject, CatalogError> {
        if subject.name.trim().is_empty() {
            return Err(CatalogError::EmptyTitle);
        }
        match self.gateway.insert_subject(subject) {
            Ok(stored) => Ok(stored),
            Err(GatewayError::Conflict) => Err(CatalogError::DuplicateSubject),
            Err(other) => Err(other.into()),
        }
    }

    /// Seed many subjects at once, skipping names already present for their
    /// grade. Used by the CSV import path.
    pub fn seed_subjects(&self, subjects: Vec<NewSubject>) -> Result<SeedSummary, CatalogError> {
        let mut summary = SeedSummary {
            inserted: 0,
            skipped: 0,
        };
        for subject in subjects {
            match self.add_subject(subject) {
                Ok(_) => summary.inserted += 1,
                Err(CatalogError::DuplicateSubject) => summary.skipped += 1,
                Err(other) => return Err(other),
            }
        }
        Ok(summary)
    }

    pub fn rename_subject(&self, id: SubjectId, name: &str) -> Result<Subject, CatalogError> {
        if name.trim().is_empty() {
            return Err(CatalogError::EmptyTitle);
        }
        let mut subject = self
            .gateway
            .fetch_subject(id)?
            .ok_or(CatalogError::SubjectNotFound)?;
        if self.gateway.subject_has_approved_link(id)? {
            return Err(CatalogError::SubjectLocked);
        }

        subject.name = name.trim().to_string();
        match self.gateway.update_subject(subject.clone()) {
            Ok(()) => Ok(subject),
            Err(GatewayError::NotFound) => Err(CatalogError::SubjectNotFound),
            Err(other) => Err(other.into()),
        }
    }

    pub fn remove_subject(&self, id: SubjectId) -> Result<(), CatalogError> {
        self.gateway
            .fetch_subject(id)?
            .ok_or(CatalogError::SubjectNotFound)?;
        if self.gateway.subject_has_approved_link(id)? {
            return Err(CatalogError::SubjectLocked);
        }
        match self.gateway.delete_subject(id) {
            Ok(()) => Ok(()),
            Err(GatewayError::NotFound) => Err(CatalogError::SubjectNotFound),
            Err(other) => Err(other.into()),
        }
    }

    pub fn add_course(&self, title: &str) -> Result<Course, CatalogError> {
        if title.trim().is_empty() {
            return Err(CatalogError::EmptyTitle);
        }
        Ok(self.gateway.insert_course(title.trim().to_string())?)
    }

    pub fn list_courses(&self) -> Result<Vec<Course>, CatalogError> {
        Ok(self.gateway.list_courses()?)
    }

    /// Deleting a course removes its books as well.
    pub fn remove_course(&self, id: CourseId) -> Result<(), CatalogError> {
        match self.gateway.delete_course(id) {
            Ok(()) => Ok(()),
            Err(GatewayError::NotFound) => Err(CatalogError::CourseNotFound),
            Err(other) => Err(other.into()),
        }
    }

    pub fn add_book(
        &self,
        title: &str,
        author: &str,
        course_id: CourseId,
    ) -> Result<Book, CatalogError> {
        if title.trim().is_empty() {
            return Err(CatalogError::EmptyTitle);
        }
        match self
            .gateway
            .insert_book(title.trim().to_string(), author.trim().to_string(), course_id)
        {
            Ok(book) => Ok(book),
            Err(GatewayError::NotFound) => Err(CatalogError::CourseNotFound),
            Err(other) => Err(other.into()),
        }
    }

    pub fn books_for_course(&self, course_id: CourseId) -> Result<Vec<Book>, CatalogError> {
        self.gateway
            .fetch_course(course_id)?
            .ok_or(CatalogError::CourseNotFound)?;
        Ok(self.gateway.books_for_course(course_id)?)
    }

    pub fn remove_book(&self, id: BookId) -> Result<(), CatalogError> {
        match self.gateway.delete_book(id) {
            Ok(()) => Ok(()),
            Err(GatewayError::NotFound) => Err(CatalogError::BookNotFound),
            Err(other) => Err(other.into()),
        }
    }
}

/// Error raised by catalog maintenance.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("title must not be blank")]
    EmptyTitle,
    #[error("a subject with that name already exists for the grade")]
    DuplicateSubject,
    #[error("subject not found")]
    SubjectNotFound,
    #[error("subject is referenced by an approved tutor link")]
    SubjectLocked,
    #[error("course not found")]
    CourseNotFound,
    #[error("book not found")]
    BookNotFound,
    #[error("persistence failure: {0}")]
    Persistence(#[from] GatewayError),
}
