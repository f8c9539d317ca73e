//! Domain model: entities, result containers, and canonical hashing.
//!
//! All values here are plain data. `hash_code` fields are order-independent
//! SHA-256 digests: permuting a result set's `resources` never changes its
//! hash, and any identity attribute (everything except `scim_id` and the
//! hash itself) feeds into it. Structural equality between two sides is hash
//! equality, which is what the incremental fast path relies on.

mod group;
mod hash;
mod member;
mod state;
mod user;

pub use group::{Group, GroupBuilder, GroupsResult};
pub use member::{
    GroupMembers, GroupMembersBuilder, GroupsMembersResult, Member, MemberBuilder, MembersResult,
};
pub use state::{State, StateResources, STATE_SCHEMA_VERSION};
pub use user::{Name, User, UserBuilder, UsersResult};
