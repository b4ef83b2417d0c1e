mod list;
mod lookup;
mod migrate;
mod shows;
mod update;

pub use list::cmd_list_episodes;
pub use lookup::cmd_lookup;
pub use migrate::cmd_migrate;
pub use shows::{cmd_add_show, cmd_list_shows, cmd_remove_show, cmd_set_enabled};
pub use update::cmd_update;
