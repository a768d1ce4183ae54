use serde::{Deserialize, Serialize};

use rotasync_core::ids::ChatUserId;

/// A chat-platform user as returned by group membership listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: ChatUserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl GroupMember {
    /// `first.last`, the way members are logged.
    pub fn display_name(&self) -> String {
        format!(
            "{}.{}",
            self.first_name.to_lowercase(),
            self.last_name.to_lowercase()
        )
    }
}

/// Pagination window for membership listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 0,
            per_page: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnouncementKind {
    OnCall,
    Support,
}

/// A rich message ready to be sent to a chat webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub kind: AnnouncementKind,
    pub target: String,
    pub sender: String,
    pub icon_url: String,
    pub title: String,
    pub title_link: String,
    pub color: String,
    pub heading: String,
    pub roles: Vec<(String, String)>,
    pub footer: String,
}

const TITLE_LINK: &str = "https://mattermost.app.opsgenie.com/alert";
const COLOR: &str = "#0000ff";
const ON_CALL_ICON: &str = "https://vignette.wikia.nocookie.net/ghostbusters/images/a/a7/NoGhostSign.jpg/revision/latest/scale-to-width-down/340?cb=20090213041921";
const SUPPORT_ICON: &str = "https://mystickermania.com/cdn/stickers/memes/sticker_2094-512x512.png";

impl Announcement {
    pub fn on_call(target: &str, handle: &str, primary: &str, secondary: &str) -> Self {
        Self {
            kind: AnnouncementKind::OnCall,
            target: target.to_string(),
            sender: "OnCall Notifier".into(),
            icon_url: ON_CALL_ICON.into(),
            title: "SRE Oncall".into(),
            title_link: TITLE_LINK.into(),
            color: COLOR.into(),
            heading: "Who is onCall?".into(),
            roles: vec![
                ("Primary".into(), format!("@{primary}")),
                ("Secondary".into(), format!("@{secondary}")),
            ],
            footer: format!("_Who you gonna call?_ Use: @{handle}"),
        }
    }

    /// Support members are labelled `Support A`, `Support B`, ...
    pub fn support(target: &str, handle: &str, members: &[String]) -> Self {
        let roles = members
            .iter()
            .enumerate()
            .map(|(i, m)| (format!("Support {}", slot_label(i)), format!("@{m}")))
            .collect();
        Self {
            kind: AnnouncementKind::Support,
            target: target.to_string(),
            sender: "SRE Support Notifier".into(),
            icon_url: SUPPORT_ICON.into(),
            title: "SRE Support".into(),
            title_link: TITLE_LINK.into(),
            color: COLOR.into(),
            heading: "Who is on SRE Support?".into(),
            roles,
            footer: format!("_Who you gonna ask for help?_ Use: @{handle}"),
        }
    }
}

fn slot_label(i: usize) -> String {
    match u8::try_from(i) {
        Ok(n) if n < 26 => char::from(b'A' + n).to_string(),
        _ => (i + 1).to_string(),
    }
}
