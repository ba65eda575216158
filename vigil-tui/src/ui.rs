use ratatui::Frame;

use crate::app::{ActivePopup, App};

pub fn render(app: &mut App, frame: &mut Frame) {
    app.render(frame);

    if let Some(ActivePopup::Help) = app.active_popup {
        app.help.render(frame);
    }

    for (index, notification) in app.notifications.iter().enumerate() {
        notification.render(index, frame);
    }
}
