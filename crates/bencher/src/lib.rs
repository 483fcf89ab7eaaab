//! Inputs shared by the intake benchmarks

#[derive(Debug, Copy, Clone)]
pub struct BindCase {
    name: &'static str,
    group: CaseGroup,
    payload: Payload,
}

impl BindCase {
    pub fn new(name: &'static str, group: CaseGroup, payload: Payload) -> Self {
        Self { name, group, payload }
    }

    pub fn small(name: &'static str, payload: Payload) -> Self {
        Self::new(name, CaseGroup::Small, payload)
    }

    pub fn large(name: &'static str, payload: Payload) -> Self {
        Self::new(name, CaseGroup::Large, payload)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> CaseGroup {
        self.group
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

/// A request body together with the content type it is sent with
#[derive(Debug, Copy, Clone)]
pub struct Payload {
    content_type: &'static str,
    body: &'static str,
}

impl Payload {
    pub const fn json(body: &'static str) -> Self {
        Self { content_type: "application/json", body }
    }

    pub const fn form(body: &'static str) -> Self {
        Self { content_type: "application/x-www-form-urlencoded", body }
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn body(&self) -> &'static str {
        self.body
    }
}

#[derive(Clone, Copy, Debug)]
pub enum CaseGroup {
    Small,
    Large,
}
