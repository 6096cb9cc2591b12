use druid::kurbo::{Point, Rect, Size};
use druid::piet::Color;
use druid::piet::Text as PietText;
use druid::piet::{TextLayout, TextLayoutBuilder};
use druid::RenderContext;
use druid::{Data, Env, Event, EventCtx, LayoutCtx, LifeCycle, LifeCycleCtx, PaintCtx, UpdateCtx, Widget};

use crate::state::AppState;

/// Progress bar for the in-flight suggestion round.
pub struct ProgressBar;

impl Widget<AppState> for ProgressBar {
    fn event(&mut self, _ctx: &mut EventCtx, _event: &Event, _data: &mut AppState, _env: &Env) {}
    fn lifecycle(&mut self, _ctx: &mut LifeCycleCtx, _event: &LifeCycle, _data: &AppState, _env: &Env) {}
    fn update(&mut self, ctx: &mut UpdateCtx, old_data: &AppState, data: &AppState, _env: &Env) {
        if !old_data.same(data) {
            ctx.request_paint();
        }
    }
    fn layout(&mut self, _ctx: &mut LayoutCtx, bc: &druid::BoxConstraints, _data: &AppState, _env: &Env) -> Size {
        let height = 20.0;
        let width = bc.max().width;
        Size::new(width, height)
    }
    fn paint(&mut self, ctx: &mut PaintCtx, data: &AppState, env: &Env) {
        if data.round_in_progress && data.round_total > 0 {
            let progress = data.round_done as f64 / data.round_total as f64;
            let rect = ctx.size().to_rect();
            let filled_rect = Rect::new(rect.x0, rect.y0, rect.x0 + rect.width() * progress, rect.y1);
            ctx.fill(rect, &env.get(druid::theme::BACKGROUND_LIGHT));
            ctx.fill(filled_rect, &Color::rgb8(0, 128, 0));
            let text = format!("{:.0}% ({}/{})", progress * 100.0, data.round_done, data.round_total);
            let text_layout = ctx
                .text()
                .new_text_layout(text)
                .text_color(Color::WHITE)
                .build()
                .unwrap();
            let text_size = text_layout.size();
            let text_pos = Point::new(rect.center().x - text_size.width / 2.0, rect.center().y - text_size.height / 2.0);
            ctx.draw_text(&text_layout, text_pos);
        }
    }
}
