//! HUD: mana bar, day/time readout, score line, quest hint, lunar banner.

use bevy::prelude::*;

use crate::shared::*;

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_hud).add_systems(
            Update,
            (
                update_mana_bar,
                update_clock_text,
                update_score_text,
                update_quest_text,
                update_lunar_banner,
                update_status_line,
            ),
        );
    }
}

#[derive(Component)]
struct ManaBarFill;

#[derive(Component)]
struct ClockText;

#[derive(Component)]
struct ScoreText;

#[derive(Component)]
struct QuestText;

#[derive(Component)]
struct LunarBanner;

#[derive(Component)]
struct StatusText;

/// Countdown until the status line is cleared again.
struct StatusTimer(Timer);

impl Default for StatusTimer {
    fn default() -> Self {
        // Pre-expired so a fresh HUD shows nothing.
        let mut timer = Timer::from_seconds(3.0, TimerMode::Once);
        timer.tick(std::time::Duration::from_secs(3));
        Self(timer)
    }
}

// Day 0 is a Monday, so the lunar weekday index lands on Thursday.
const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

fn spawn_hud(mut commands: Commands) {
    commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            flex_direction: FlexDirection::Column,
            row_gap: Val::Px(6.0),
            ..default()
        })
        .with_children(|parent| {
            // Mana bar frame with a fill whose width tracks current mana.
            parent
                .spawn((
                    Node {
                        width: Val::Px(220.0),
                        height: Val::Px(18.0),
                        padding: UiRect::all(Val::Px(2.0)),
                        ..default()
                    },
                    BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
                ))
                .with_children(|frame| {
                    frame.spawn((
                        ManaBarFill,
                        Node {
                            width: Val::Percent(100.0),
                            height: Val::Percent(100.0),
                            ..default()
                        },
                        BackgroundColor(Color::srgb(0.30, 0.55, 0.95)),
                    ));
                });

            parent.spawn((
                ClockText,
                Text::new("Day 1 (Mon) — 00:00"),
                TextFont::from_font_size(18.0),
                TextColor(Color::WHITE),
            ));
            parent.spawn((
                ScoreText,
                Text::new("Score 0"),
                TextFont::from_font_size(18.0),
                TextColor(Color::WHITE),
            ));
            parent.spawn((
                QuestText,
                Text::new(""),
                TextFont::from_font_size(16.0),
                TextColor(Color::srgb(0.95, 0.85, 0.45)),
            ));
            parent.spawn((
                StatusText,
                Text::new(""),
                TextFont::from_font_size(16.0),
                TextColor(Color::srgb(0.75, 0.75, 0.75)),
            ));
        });

    commands.spawn((
        LunarBanner,
        Text::new("The lunar night has come. Damaged books stir."),
        TextFont::from_font_size(24.0),
        TextColor(Color::srgb(0.80, 0.55, 1.0)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(60.0),
            justify_self: JustifySelf::Center,
            ..default()
        },
        Visibility::Hidden,
    ));
}

fn update_mana_bar(mana: Res<Mana>, mut fill: Query<&mut Node, With<ManaBarFill>>) {
    let Ok(mut node) = fill.get_single_mut() else {
        return;
    };
    let fraction = if mana.max > 0.0 {
        (mana.current / mana.max).clamp(0.0, 1.0)
    } else {
        0.0
    };
    node.width = Val::Percent(fraction * 100.0);
}

fn update_clock_text(clock: Res<SimClock>, mut text: Query<&mut Text, With<ClockText>>) {
    let Ok(mut text) = text.get_single_mut() else {
        return;
    };
    let hour = clock.hour_of_day();
    let weekday = WEEKDAYS[(clock.current_day() % 7) as usize];
    text.0 = format!(
        "Day {} ({weekday}) — {:02}:{:02}",
        clock.current_day() + 1,
        hour as u32,
        ((hour.fract()) * 60.0) as u32
    );
}

fn update_score_text(stats: Res<PlayerStats>, mut text: Query<&mut Text, With<ScoreText>>) {
    if !stats.is_changed() {
        return;
    }
    let Ok(mut text) = text.get_single_mut() else {
        return;
    };
    text.0 = format!(
        "Score {}  |  Helped {}  |  Restored {}",
        stats.score, stats.visitors_helped, stats.restored_books
    );
}

fn update_quest_text(quest: Res<ActiveQuest>, mut text: Query<&mut Text, With<QuestText>>) {
    if !quest.is_changed() {
        return;
    }
    let Ok(mut text) = text.get_single_mut() else {
        return;
    };
    text.0 = match quest.0 {
        Some(target) => format!("A visitor wants a book — shelf {}", target.shelf + 1),
        None => String::new(),
    };
}

/// Show save/load outcomes for a few seconds, then clear.
fn update_status_line(
    time: Res<Time>,
    mut saves: EventReader<SaveCompleteEvent>,
    mut loads: EventReader<LoadCompleteEvent>,
    mut timer: Local<StatusTimer>,
    mut text: Query<&mut Text, With<StatusText>>,
) {
    let Ok(mut text) = text.get_single_mut() else {
        return;
    };
    for event in saves.read() {
        text.0 = match &event.error_message {
            None => "Game saved".to_string(),
            Some(err) => format!("Save failed: {err}"),
        };
        timer.0.reset();
    }
    for event in loads.read() {
        text.0 = match &event.error_message {
            None => "Game loaded".to_string(),
            Some(err) => format!("Load failed: {err}"),
        };
        timer.0.reset();
    }
    if timer.0.tick(time.delta()).just_finished() {
        text.0.clear();
    }
}

fn update_lunar_banner(
    clock: Res<SimClock>,
    mut banner: Query<&mut Visibility, With<LunarBanner>>,
) {
    let Ok(mut visibility) = banner.get_single_mut() else {
        return;
    };
    *visibility = if clock.is_lunar_night() {
        Visibility::Visible
    } else {
        Visibility::Hidden
    };
}
