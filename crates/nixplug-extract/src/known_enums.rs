//! Enumerations declared outside any source we analyze.
//!
//! Plugins import these from client type packages whose declarations are not
//! part of the plugin tree, so the symbol table can never see them. The table
//! is deliberately small and explicit: a member missing from it stays
//! unresolved rather than being guessed.

const ACTIVITY_TYPE: &[(&str, i64)] = &[
  ("PLAYING", 0),
  ("STREAMING", 1),
  ("LISTENING", 2),
  ("WATCHING", 3),
  ("CUSTOM_STATUS", 4),
  ("COMPETING", 5),
];

const CHANNEL_TYPE: &[(&str, i64)] = &[
  ("GUILD_TEXT", 0),
  ("DM", 1),
  ("GUILD_VOICE", 2),
  ("GROUP_DM", 3),
  ("GUILD_CATEGORY", 4),
  ("GUILD_ANNOUNCEMENT", 5),
  ("ANNOUNCEMENT_THREAD", 10),
  ("PUBLIC_THREAD", 11),
  ("PRIVATE_THREAD", 12),
  ("GUILD_STAGE_VOICE", 13),
  ("GUILD_DIRECTORY", 14),
  ("GUILD_FORUM", 15),
  ("GUILD_MEDIA", 16),
];

const STICKER_FORMAT: &[(&str, i64)] = &[
  ("PNG", 1),
  ("APNG", 2),
  ("LOTTIE", 3),
  ("GIF", 4),
];

const KNOWN_ENUMS: &[(&str, &[(&str, i64)])] = &[
  ("ActivityType", ACTIVITY_TYPE),
  ("ChannelType", CHANNEL_TYPE),
  ("StickerFormatType", STICKER_FORMAT),
];

/// Value of `enum_name.member` if both are in the table.
#[must_use]
pub fn lookup(enum_name: &str, member: &str) -> Option<i64> {
  KNOWN_ENUMS
    .iter()
    .find(|(name, _)| *name == enum_name)
    .and_then(|(_, members)| members.iter().find(|(m, _)| *m == member))
    .map(|(_, value)| *value)
}
