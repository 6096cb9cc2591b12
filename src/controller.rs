use druid::{Env, Event, EventCtx, Widget};
use rfd::{MessageButtons, MessageDialog, MessageLevel};

use crate::events::{RENAME_DONE, SUGGESTION_DONE, SUGGESTION_PROGRESS};
use crate::state::AppState;

pub struct AppController;

impl<W: Widget<AppState>> druid::widget::Controller<AppState, W> for AppController {
    fn event(
        &mut self,
        child: &mut W,
        ctx: &mut EventCtx,
        event: &Event,
        data: &mut AppState,
        env: &Env,
    ) {
        if let Event::Command(cmd) = event {
            if let Some(&(done, total)) = cmd.get(SUGGESTION_PROGRESS) {
                data.round_done = done;
                data.round_total = total;
                // Results land in the registry as they arrive; show them.
                data.refresh_rows();
                ctx.request_update();
                ctx.set_handled();
                return;
            }
            if let Some(msg) = cmd.get(SUGGESTION_DONE) {
                data.status_message = msg.clone();
                data.round_in_progress = false;
                data.refresh_rows();
                ctx.request_update();
                ctx.set_handled();
                return;
            }
            if let Some(msg) = cmd.get(RENAME_DONE) {
                data.status_message = msg.clone();
                data.round_in_progress = false;
                data.refresh_rows();
                let message = msg.clone();
                std::thread::spawn(move || {
                    MessageDialog::new()
                        .set_title("Rename complete")
                        .set_description(&message)
                        .set_buttons(MessageButtons::Ok)
                        .set_level(MessageLevel::Info)
                        .show();
                });
                ctx.request_update();
                ctx.set_handled();
                return;
            }
        }
        child.event(ctx, event, data, env);
    }
}
