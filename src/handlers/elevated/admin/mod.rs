// handlers/elevated/admin - user and unit administration (admin role only)
pub mod opds;
pub mod users;

pub use opds::{opd_can_delete, opd_create, opd_delete, opd_update};
pub use users::{user_create, user_delete, user_list, user_show, user_update};
