use druid::piet::Color;
use druid::widget::CrossAxisAlignment;
use druid::widget::LineBreaking;
use druid::widget::{Button, Flex, Label, List, Scroll, TextBox};
use druid::{Env, Widget, WidgetExt};

use crate::actions::{choose_directory, load_directory, start_rename_round, start_suggestion_round};
use crate::controller::AppController;
use crate::state::{AppState, FileRow};
use crate::widgets::ProgressBar;

pub fn build_ui() -> impl Widget<AppState> {
    const LABEL_WIDTH: f64 = 120.0;

    let directory_row = Flex::row()
        .with_child(Label::new("Directory:").fix_width(LABEL_WIDTH))
        .with_spacer(5.0)
        .with_flex_child(TextBox::new().lens(AppState::selected_dir).fix_height(30.0), 1.0)
        .with_spacer(5.0)
        .with_child(Button::new("Browse").on_click(|_ctx, data: &mut AppState, _env| {
            choose_directory(data);
        }))
        .with_spacer(5.0)
        .with_child(Button::new("Reload").on_click(|_ctx, data: &mut AppState, _env| {
            load_directory(data);
        }));

    let button_row = Flex::row()
        .with_child(
            Button::new("Suggest Names")
                .on_click(|ctx, data: &mut AppState, _env| start_suggestion_round(ctx, data))
                .fix_size(140.0, 40.0)
                .disabled_if(|data: &AppState, _env| data.round_in_progress || data.rows.is_empty()),
        )
        .with_spacer(10.0)
        .with_child(
            Button::new("Rename Files")
                .on_click(|ctx, data: &mut AppState, _env| start_rename_round(ctx, data))
                .fix_size(140.0, 40.0)
                .disabled_if(|data: &AppState, _env| data.round_in_progress || !data.can_rename),
        );

    let top_panel = Flex::column()
        .with_child(Label::new("Smart Rename").with_text_size(24.0))
        .with_spacer(10.0)
        .with_child(directory_row)
        .with_spacer(10.0)
        .with_child(button_row)
        .with_spacer(10.0)
        .with_child(Label::new(|data: &String, _env: &Env| data.clone()).lens(AppState::status_message))
        .with_spacer(10.0)
        .with_child(ProgressBar)
        .cross_axis_alignment(CrossAxisAlignment::Start);

    let file_list = List::new(|| {
        Flex::column()
            .with_child(
                Flex::row()
                    .with_child(Label::new(|item: &FileRow, _env: &Env| item.name.clone()))
                    .with_spacer(10.0)
                    .with_child(Label::new("→").with_text_color(Color::grey(0.6)))
                    .with_spacer(10.0)
                    .with_child(Label::new(|item: &FileRow, _env: &Env| item.suggestion.clone())),
            )
            .with_child(
                Label::new(|item: &FileRow, _env: &Env| item.content_preview.clone())
                    .with_text_color(Color::grey(0.6))
                    .with_text_size(10.0)
                    .with_line_break_mode(LineBreaking::WordWrap)
                    .expand_width(),
            )
            .with_child(
                Label::new(|item: &FileRow, _env: &Env| item.status.clone())
                    .with_text_color(Color::grey(0.8))
                    .with_text_size(10.0),
            )
            .cross_axis_alignment(CrossAxisAlignment::Start)
            .padding((0.0, 4.0))
    })
    .lens(AppState::rows);

    let list_panel = Flex::column()
        .with_child(Label::new(|data: &AppState, _env: &Env| format!("Files ({})", data.rows.len())))
        .with_spacer(5.0)
        .with_flex_child(Scroll::new(file_list).vertical().expand_width(), 1.0)
        .cross_axis_alignment(CrossAxisAlignment::Start);

    Flex::column()
        .with_child(top_panel)
        .with_spacer(10.0)
        .with_flex_child(list_panel, 1.0)
        .padding(10.0)
        .expand()
        .controller(AppController)
}
