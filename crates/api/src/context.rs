use adminhub_auth::Principal;

/// Outcome of credential resolution for a request.
///
/// Always present on `/api/v1` requests; `None` means no usable credential was
/// presented, which only the gate turns into a denial.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPrincipal(pub Option<Principal>);

impl ResolvedPrincipal {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}
