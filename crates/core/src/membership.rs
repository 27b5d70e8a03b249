use async_trait::async_trait;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("membership lookup failed: {0}")]
pub struct MembershipError(pub String);

/// Answers whether a user currently belongs to the channel that gates the bot.
#[async_trait]
pub trait MembershipOracle: Send + Sync {
    async fn is_member(&self, user_id: i64) -> Result<bool, MembershipError>;
}

/// Fixed answer for every user.
#[derive(Clone, Copy, Debug)]
pub struct StaticMembershipOracle {
    member: bool,
}

impl StaticMembershipOracle {
    pub fn allow_all() -> Self {
        Self { member: true }
    }

    pub fn deny_all() -> Self {
        Self { member: false }
    }
}

#[async_trait]
impl MembershipOracle for StaticMembershipOracle {
    async fn is_member(&self, _user_id: i64) -> Result<bool, MembershipError> {
        Ok(self.member)
    }
}
