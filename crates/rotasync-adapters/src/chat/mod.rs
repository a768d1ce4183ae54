mod mattermost;

pub use mattermost::MattermostDirectory;
