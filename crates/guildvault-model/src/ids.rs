use serde::{Deserialize, Serialize};

// All identifiers are platform-assigned opaque strings.  The platform
// rejects client-chosen ids, so a restore always allocates new ones.

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of a guild (the top-level community container).
    GuildId
);

string_id!(
    /// Identifier of a role.
    RoleId
);

string_id!(
    /// Identifier of a channel.
    ChannelId
);

string_id!(
    /// Identifier of a user.  User ids are not guild-scoped and survive a
    /// restore unchanged.
    UserId
);

string_id!(
    /// Identifier of a message.
    MessageId
);
