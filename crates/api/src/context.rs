use companies_infra::Session;

/// Database session for a request.
///
/// Built by the session scope for each request and passed to the handler
/// alongside it. The session is closed when the handler returns.
#[derive(Debug, Clone)]
pub struct SessionContext {
    session: Session,
}

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
