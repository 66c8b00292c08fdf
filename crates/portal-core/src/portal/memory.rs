use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::domain::{
    Book, BookId, ChatChannel, ChatMessage, ChannelId, Course, CourseId, Grade, GradeBand,
    MessageId, NewAccount, NewStudentProfile, NewSubject, NewTutorProfile, StudentId,
    StudentProfile, StudentRecord, Subject, SubjectId, TutorId, TutorProfile, TutorRecord,
    TutorSubjectLink, UserAccount, UserId,
};
use super::gateway::{GatewayError, PortalGateway};

/// Gateway backed by a single in-process state table. One mutex guards the
/// whole state, so every multi-row write commits atomically with respect to
/// concurrent callers.
#[derive(Default)]
pub struct InMemoryPortalGateway {
    state: Mutex<PortalState>,
}

#[derive(Default)]
struct PortalState {
    accounts: BTreeMap<UserId, UserAccount>,
    subjects: BTreeMap<SubjectId, Subject>,
    students: BTreeMap<StudentId, StudentProfile>,
    student_subjects: BTreeMap<StudentId, BTreeSet<SubjectId>>,
    tutors: BTreeMap<TutorId, TutorProfile>,
    tutor_subjects: BTreeMap<(TutorId, SubjectId), TutorSubjectLink>,
    channels: BTreeMap<ChannelId, ChatChannel>,
    memberships: BTreeSet<(UserId, ChannelId)>,
    messages: Vec<ChatMessage>,
    courses: BTreeMap<CourseId, Course>,
    books: BTreeMap<BookId, Book>,
    sequences: Sequences,
}

#[derive(Default)]
struct Sequences {
    user: u64,
    student: u64,
    tutor: u64,
    subject: u32,
    channel: u64,
    message: u64,
    course: u32,
    book: u32,
}

impl InMemoryPortalGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, PortalState>, GatewayError> {
        self.state
            .lock()
            .map_err(|_| GatewayError::Unavailable("state mutex poisoned".to_string()))
    }
}

impl PortalState {
    fn tutor_record(&self, profile: &TutorProfile) -> TutorRecord {
        let links = self
            .tutor_subjects
            .values()
            .filter(|link| link.tutor_id == profile.id)
            .cloned()
            .collect();
        TutorRecord {
            profile: profile.clone(),
            links,
        }
    }

    fn student_record(&self, profile: &StudentProfile) -> StudentRecord {
        StudentRecord {
            profile: profile.clone(),
            subject_ids: self
                .student_subjects
                .get(&profile.id)
                .cloned()
                .unwrap_or_default(),
        }
    }

    fn remove_student_rows(&mut self, id: StudentId) {
        self.students.remove(&id);
        self.student_subjects.remove(&id);
    }

    fn remove_tutor_rows(&mut self, id: TutorId) {
        self.tutors.remove(&id);
        self.tutor_subjects.retain(|(tutor, _), _| *tutor != id);
    }
}

impl PortalGateway for InMemoryPortalGateway {
    fn insert_account(&self, account: NewAccount) -> Result<UserAccount, GatewayError> {
        let mut state = self.state()?;
        let taken = state
            .accounts
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&account.email));
        if taken {
            return Err(GatewayError::Conflict);
        }

        state.sequences.user += 1;
        let stored = UserAccount {
            id: UserId(format!("user-{:06}", state.sequences.user)),
            full_name: account.full_name,
            email: account.email,
            phone: account.phone,
            role: account.role,
            status: account.status,
            created_at: account.created_at,
        };
        state.accounts.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    fn fetch_account(&self, id: &UserId) -> Result<Option<UserAccount>, GatewayError> {
        Ok(self.state()?.accounts.get(id).cloned())
    }

    fn list_accounts(&self, limit: usize) -> Result<Vec<UserAccount>, GatewayError> {
        Ok(self.state()?.accounts.values().take(limit).cloned().collect())
    }

    fn update_account(&self, account: UserAccount) -> Result<(), GatewayError> {
        let mut state = self.state()?;
        if !state.accounts.contains_key(&account.id) {
            return Err(GatewayError::NotFound);
        }
        let taken = state.accounts.values().any(|existing| {
            existing.id != account.id && existing.email.eq_ignore_ascii_case(&account.email)
        });
        if taken {
            return Err(GatewayError::Conflict);
        }
        state.accounts.insert(account.id.clone(), account);
        Ok(())
    }

    fn delete_account(&self, id: &UserId) -> Result<(), GatewayError> {
        let mut state = self.state()?;
        if state.accounts.remove(id).is_none() {
            return Err(GatewayError::NotFound);
        }

        let student_id = state
            .students
            .values()
            .find(|profile| &profile.user_id == id)
            .map(|profile| profile.id);
        if let Some(student_id) = student_id {
            state.remove_student_rows(student_id);
        }

        let tutor_id = state
            .tutors
            .values()
            .find(|profile| &profile.user_id == id)
            .map(|profile| profile.id);
        if let Some(tutor_id) = tutor_id {
            state.remove_tutor_rows(tutor_id);
        }
        state.memberships.retain(|(user, _)| user != id);
        state.messages.retain(|message| &message.sender != id);
        Ok(())
    }

    fn insert_subject(&self, subject: NewSubject) -> Result<Subject, GatewayError> {
        let mut state = self.state()?;
        let taken = state.subjects.values().any(|existing| {
            existing.grade == subject.grade && existing.name.eq_ignore_ascii_case(&subject.name)
        });
        if taken {
            return Err(GatewayError::Conflict);
        }

        state.sequences.subject += 1;
        let stored = Subject {
            id: SubjectId(state.sequences.subject),
            name: subject.name,
            grade: subject.grade,
        };
        state.subjects.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn fetch_subject(&self, id: SubjectId) -> Result<Option<Subject>, GatewayError> {
        Ok(self.state()?.subjects.get(&id).cloned())
    }

    fn subjects_for_grade(&self, grade: Grade) -> Result<Vec<Subject>, GatewayError> {
        Ok(self
            .state()?
            .subjects
            .values()
            .filter(|subject| subject.grade == grade)
            .cloned()
            .collect())
    }

    fn subjects_for_band(&self, band: GradeBand) -> Result<Vec<Subject>, GatewayError> {
        Ok(self
            .state()?
            .subjects
            .values()
            .filter(|subject| band.contains(subject.grade))
            .cloned()
            .collect())
    }

    fn update_subject(&self, subject: Subject) -> Result<(), GatewayError> {
        let mut state = self.state()?;
        if !state.subjects.contains_key(&subject.id) {
            return Err(GatewayError::NotFound);
        }
        state.subjects.insert(subject.id, subject);
        Ok(())
    }

    fn delete_subject(&self, id: SubjectId) -> Result<(), GatewayError> {
        let mut state = self.state()?;
        if state.subjects.remove(&id).is_none() {
            return Err(GatewayError::NotFound);
        }
        for selected in state.student_subjects.values_mut() {
            selected.remove(&id);
        }
        state.tutor_subjects.retain(|(_, subject), _| *subject != id);
        Ok(())
    }

    fn subject_has_approved_link(&self, id: SubjectId) -> Result<bool, GatewayError> {
        Ok(self
            .state()?
            .tutor_subjects
            .values()
            .any(|link| link.subject_id == id && link.approved))
    }

    fn insert_student(
        &self,
        profile: NewStudentProfile,
        subject_ids: &BTreeSet<SubjectId>,
    ) -> Result<StudentRecord, GatewayError> {
        let mut state = self.state()?;
        let exists = state
            .students
            .values()
            .any(|existing| existing.user_id == profile.user_id);
        if exists {
            return Err(GatewayError::Conflict);
        }

        state.sequences.student += 1;
        let stored = StudentProfile {
            id: StudentId(state.sequences.student),
            user_id: profile.user_id,
            date_of_birth: profile.date_of_birth,
            grade: profile.grade,
            enrollment_date: profile.enrollment_date,
            can_join_subject_channels: profile.can_join_subject_channels,
            status: profile.status,
        };
        state.students.insert(stored.id, stored.clone());
        state.student_subjects.insert(stored.id, subject_ids.clone());
        Ok(state.student_record(&stored))
    }

    fn student_for_user(&self, user_id: &UserId) -> Result<Option<StudentRecord>, GatewayError> {
        let state = self.state()?;
        Ok(state
            .students
            .values()
            .find(|profile| &profile.user_id == user_id)
            .map(|profile| state.student_record(profile)))
    }

    fn update_student(
        &self,
        profile: StudentProfile,
        subject_ids: &BTreeSet<SubjectId>,
    ) -> Result<(), GatewayError> {
        let mut state = self.state()?;
        if !state.students.contains_key(&profile.id) {
            return Err(GatewayError::NotFound);
        }
        state.student_subjects.insert(profile.id, subject_ids.clone());
        state.students.insert(profile.id, profile);
        Ok(())
    }

    fn delete_student(&self, id: StudentId) -> Result<(), GatewayError> {
        let mut state = self.state()?;
        if !state.students.contains_key(&id) {
            return Err(GatewayError::NotFound);
        }
        state.remove_student_rows(id);
        Ok(())
    }

    fn insert_tutor(
        &self,
        profile: NewTutorProfile,
        subject_ids: &BTreeSet<SubjectId>,
    ) -> Result<TutorRecord, GatewayError> {
        let mut state = self.state()?;
        let exists = state
            .tutors
            .values()
            .any(|existing| existing.user_id == profile.user_id);
        if exists {
            return Err(GatewayError::Conflict);
        }

        state.sequences.tutor += 1;
        let stored = TutorProfile {
            id: TutorId(state.sequences.tutor),
            user_id: profile.user_id,
            grade_band: profile.grade_band,
            bio: profile.bio,
            contact_info: profile.contact_info,
            hire_date: profile.hire_date,
            registered_at: profile.registered_at,
            status: profile.status,
            is_active: profile.is_active,
        };
        state.tutors.insert(stored.id, stored.clone());
        for subject_id in subject_ids {
            state.tutor_subjects.insert(
                (stored.id, *subject_id),
                TutorSubjectLink {
                    tutor_id: stored.id,
                    subject_id: *subject_id,
                    approved: false,
                    registered_at: stored.registered_at,
                },
            );
        }
        Ok(state.tutor_record(&stored))
    }

    fn tutor_for_user(&self, user_id: &UserId) -> Result<Option<TutorRecord>, GatewayError> {
        let state = self.state()?;
        Ok(state
            .tutors
            .values()
            .find(|profile| &profile.user_id == user_id)
            .map(|profile| state.tutor_record(profile)))
    }

    fn fetch_tutor(&self, id: TutorId) -> Result<Option<TutorRecord>, GatewayError> {
        let state = self.state()?;
        Ok(state
            .tutors
            .get(&id)
            .map(|profile| state.tutor_record(profile)))
    }

    fn delete_tutor(&self, id: TutorId) -> Result<(), GatewayError> {
        let mut state = self.state()?;
        if !state.tutors.contains_key(&id) {
            return Err(GatewayError::NotFound);
        }
        state.remove_tutor_rows(id);
        Ok(())
    }

    fn tutor_subject_link(
        &self,
        tutor_id: TutorId,
        subject_id: SubjectId,
    ) -> Result<Option<TutorSubjectLink>, GatewayError> {
        Ok(self
            .state()?
            .tutor_subjects
            .get(&(tutor_id, subject_id))
            .cloned())
    }

    fn insert_tutor_subject(
        &self,
        tutor_id: TutorId,
        subject_id: SubjectId,
        registered_at: DateTime<Utc>,
    ) -> Result<TutorSubjectLink, GatewayError> {
        let mut state = self.state()?;
        if state.tutor_subjects.contains_key(&(tutor_id, subject_id)) {
            return Err(GatewayError::DuplicateLink);
        }
        let link = TutorSubjectLink {
            tutor_id,
            subject_id,
            approved: false,
            registered_at,
        };
        state
            .tutor_subjects
            .insert((tutor_id, subject_id), link.clone());
        Ok(link)
    }

    fn approve_tutor_subject(
        &self,
        tutor_id: TutorId,
        subject_id: SubjectId,
    ) -> Result<(), GatewayError> {
        let mut state = self.state()?;
        match state.tutor_subjects.get_mut(&(tutor_id, subject_id)) {
            Some(link) => {
                link.approved = true;
                Ok(())
            }
            None => Err(GatewayError::NotFound),
        }
    }

    fn ensure_channel(
        &self,
        grade: Grade,
        subject_id: Option<SubjectId>,
    ) -> Result<ChatChannel, GatewayError> {
        let mut state = self.state()?;
        if let Some(existing) = state
            .channels
            .values()
            .find(|channel| channel.grade == grade && channel.subject_id == subject_id)
        {
            return Ok(existing.clone());
        }

        state.sequences.channel += 1;
        let channel = ChatChannel {
            id: ChannelId(state.sequences.channel),
            grade,
            subject_id,
        };
        state.channels.insert(channel.id, channel.clone());
        Ok(channel)
    }

    fn fetch_channel(&self, id: ChannelId) -> Result<Option<ChatChannel>, GatewayError> {
        Ok(self.state()?.channels.get(&id).cloned())
    }

    fn insert_membership(
        &self,
        user_id: &UserId,
        channel_id: ChannelId,
    ) -> Result<bool, GatewayError> {
        let mut state = self.state()?;
        if !state.channels.contains_key(&channel_id) {
            return Err(GatewayError::NotFound);
        }
        Ok(state.memberships.insert((user_id.clone(), channel_id)))
    }

    fn is_member(&self, user_id: &UserId, channel_id: ChannelId) -> Result<bool, GatewayError> {
        Ok(self
            .state()?
            .memberships
            .contains(&(user_id.clone(), channel_id)))
    }

    fn append_message(
        &self,
        sender: &UserId,
        channel_id: ChannelId,
        text: String,
        sent_at: DateTime<Utc>,
    ) -> Result<ChatMessage, GatewayError> {
        let mut state = self.state()?;
        if !state.channels.contains_key(&channel_id) {
            return Err(GatewayError::NotFound);
        }
        state.sequences.message += 1;
        let message = ChatMessage {
            id: MessageId(state.sequences.message),
            sender: sender.clone(),
            channel_id,
            text,
            sent_at,
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    fn messages_for_channel(
        &self,
        channel_id: ChannelId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, GatewayError> {
        Ok(self
            .state()?
            .messages
            .iter()
            .filter(|message| message.channel_id == channel_id)
            .take(limit)
            .cloned()
            .collect())
    }

    fn insert_course(&self, title: String) -> Result<Course, GatewayError> {
        let mut state = self.state()?;
        state.sequences.course += 1;
        let course = Course {
            id: CourseId(state.sequences.course),
            title,
        };
        state.courses.insert(course.id, course.clone());
        Ok(course)
    }

    fn fetch_course(&self, id: CourseId) -> Result<Option<Course>, GatewayError> {
        Ok(self.state()?.courses.get(&id).cloned())
    }

    fn list_courses(&self) -> Result<Vec<Course>, GatewayError> {
        Ok(self.state()?.courses.values().cloned().collect())
    }

    fn delete_course(&self, id: CourseId) -> Result<(), GatewayError> {
        let mut state = self.state()?;
        if state.courses.remove(&id).is_none() {
            return Err(GatewayError::NotFound);
        }
        state.books.retain(|_, book| book.course_id != id);
        Ok(())
    }

    fn insert_book(
        &self,
        title: String,
        author: String,
        course_id: CourseId,
    ) -> Result<Book, GatewayError> {
        let mut state = self.state()?;
        if !state.courses.contains_key(&course_id) {
            return Err(GatewayError::NotFound);
        }
        state.sequences.book += 1;
        let book = Book {
            id: BookId(state.sequences.book),
            title,
            author,
            course_id,
        };
        state.books.insert(book.id, book.clone());
        Ok(book)
    }

    fn books_for_course(&self, course_id: CourseId) -> Result<Vec<Book>, GatewayError> {
        Ok(self
            .state()?
            .books
            .values()
            .filter(|book| book.course_id == course_id)
            .cloned()
            .collect())
    }

    fn delete_book(&self, id: BookId) -> Result<(), GatewayError> {
        let mut state = self.state()?;
        if state.books.remove(&id).is_none() {
            return Err(GatewayError::NotFound);
        }
        Ok(())
    }
}
