mod piece;
mod reminder;

pub use piece::{ClayType, DesignType, GlazeType, MAX_IMAGES, Piece, PieceImage, PieceStatus};
pub use reminder::{
    NotificationImportance, NotificationSettings, PendingReminder, ReminderRequest,
    ScheduledReminder,
};
