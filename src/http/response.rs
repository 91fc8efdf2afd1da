use crate::error::{Result, ServerError};

/// Status line and headers an application declared for its response.
///
/// Headers keep the order in which they were declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDeclaration {
    /// Status without the protocol, e.g. "200 OK"
    pub status: String,
    pub headers: Vec<(String, String)>,
}

impl ResponseDeclaration {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Status code parsed from the leading digits of the status, if any.
    pub fn status_code(&self) -> Option<u16> {
        self.status.split_whitespace().next()?.parse().ok()
    }

    fn validate(&self) -> Result<()> {
        if self.status.trim().is_empty() {
            return Err(ServerError::InvalidResponseDeclaration(
                "empty status".to_string(),
            ));
        }
        if has_line_break(&self.status) {
            return Err(ServerError::InvalidResponseDeclaration(format!(
                "line break in status {:?}",
                self.status
            )));
        }
        for (name, value) in &self.headers {
            if name.is_empty() || has_line_break(name) || has_line_break(value) {
                return Err(ServerError::InvalidResponseDeclaration(format!(
                    "illegal header {:?}: {:?}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

fn has_line_break(s: &str) -> bool {
    s.contains(['\r', '\n'])
}

#[derive(Debug)]
enum DeclarationState {
    NotDeclared,
    Declared(ResponseDeclaration),
    /// A second declaration was attempted. The request is rejected even if
    /// the application ignored the error returned to it.
    Rejected,
}

/// Response-declaration callback handed to the application.
///
/// Lives for exactly one request. `declare` moves it from not-declared to
/// declared; any later call is refused.
#[derive(Debug)]
pub struct StartResponse {
    state: DeclarationState,
}

impl StartResponse {
    pub fn new() -> Self {
        Self {
            state: DeclarationState::NotDeclared,
        }
    }

    /// Records the status and headers of the response.
    ///
    /// # Errors
    ///
    /// `DuplicateResponseDeclaration` if a response was already declared,
    /// `InvalidResponseDeclaration` if the status is empty or a status or
    /// header contains CR or LF.
    pub fn declare<I, N, V>(&mut self, status: impl Into<String>, headers: I) -> Result<()>
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        if !matches!(self.state, DeclarationState::NotDeclared) {
            self.state = DeclarationState::Rejected;
            return Err(ServerError::DuplicateResponseDeclaration);
        }

        let declaration = ResponseDeclaration {
            status: status.into(),
            headers: headers
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        };
        declaration.validate()?;

        self.state = DeclarationState::Declared(declaration);
        Ok(())
    }

    pub fn is_declared(&self) -> bool {
        matches!(self.state, DeclarationState::Declared(_))
    }

    /// Consumes the callback, yielding the declared response.
    pub fn into_declaration(self) -> Result<ResponseDeclaration> {
        match self.state {
            DeclarationState::Declared(declaration) => Ok(declaration),
            DeclarationState::NotDeclared => Err(ServerError::MissingResponseDeclaration),
            DeclarationState::Rejected => Err(ServerError::DuplicateResponseDeclaration),
        }
    }
}

impl Default for StartResponse {
    fn default() -> Self {
        Self::new()
    }
}
