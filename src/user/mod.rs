mod core;
mod profile;

pub use core::{
    NewUser, User, UserId, count_users, create_user, create_user_table, delete_user,
    get_user_by_email, get_user_by_id, is_email_available, update_user,
};
pub use profile::{delete_profile_endpoint, get_profile_page, update_profile_endpoint};
