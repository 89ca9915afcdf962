use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};
use crate::app::{App, PodPane, Screen, Side, TeePanel, MAX_TOASTS};
use crate::notify::Severity;

pub fn render(f: &mut Frame, app: &App) {
    // 1. Layout
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Body
            Constraint::Length(MAX_TOASTS as u16 + 2), // Footer / notifications
        ])
        .split(f.area());

    // 2. Header
    let header_text = match &app.screen {
        Screen::Overview { left, right, .. } => format!(
            " Namespace: {} | {}: {} pods | {}: {} pods | API: {}",
            app.namespace,
            left.cluster,
            left.view.with_snapshot(|p| p.len()),
            right.cluster,
            right.view.with_snapshot(|p| p.len()),
            app.client.base_url()
        ),
        Screen::Tee(panel) => format!(
            " TEE encapsulation | Containers: {} | API: {}",
            panel.view.with_snapshot(|c| c.len()),
            app.client.base_url()
        ),
    };
    let header = Paragraph::new(header_text)
        .block(Block::default().borders(Borders::ALL).title(" migdash "));
    f.render_widget(header, chunks[0]);

    // 3. Body
    match &app.screen {
        Screen::Overview { left, right, focus } => {
            let halves = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(chunks[1]);
            render_pods(f, halves[0], left, *focus == Side::Left);
            render_pods(f, halves[1], right, *focus == Side::Right);
        }
        Screen::Tee(panel) => render_tee(f, chunks[1], panel),
    }

    // 4. Footer
    let lines: Vec<Line> = if app.toasts().is_empty() {
        let keys = match &app.screen {
            Screen::Overview { .. } => " q quit | tab switch pane | j/k move | d delete pod | c next cluster | n next namespace",
            Screen::Tee(_) => " q quit | j/k move | e encapsulate | x decapsulate | y confirm | n cancel",
        };
        vec![Line::styled(keys, Style::default().fg(Color::DarkGray))]
    } else {
        app.toasts()
            .visible()
            .map(|n| Line::styled(format!(" {}: {}", n.summary, n.detail), severity_style(n.severity)))
            .collect()
    };
    let footer = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[2]);

    if let Screen::Tee(panel) = &app.screen {
        if let Some(req) = &panel.pending {
            let prompt = format!(
                "Are you sure you want to {} container \"{}\"?\n\n[y] confirm   [n] cancel",
                req.operation.as_str(),
                req.container_name
            );
            render_popup(f, " Confirm Operation ", &prompt);
        }
    }
}

fn severity_style(severity: Severity) -> Style {
    let color = match severity {
        Severity::Success => Color::Green,
        Severity::Info => Color::Cyan,
        Severity::Warn => Color::Yellow,
        Severity::Error => Color::Red,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn status_style(status: &str) -> Style {
    match status {
        "Running" => Style::default().fg(Color::Green),
        "Pending" | "ContainerCreating" => Style::default().fg(Color::Yellow),
        s if s.starts_with("Up") => Style::default().fg(Color::Green),
        _ => Style::default().fg(Color::Red),
    }
}

fn header_row(names: &[&'static str]) -> Row<'static> {
    let cells = names
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    Row::new(cells).height(1).bottom_margin(1)
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let border = if focused { Style::default().fg(Color::Cyan) } else { Style::default() };
    Block::default().borders(Borders::ALL).border_style(border).title(title)
}

fn render_pods(f: &mut Frame, area: Rect, pane: &PodPane, focused: bool) {
    let rows: Vec<Row> = pane.view.with_snapshot(|pods| {
        pods.iter()
            .map(|pod| {
                let status = match &pod.reason {
                    Some(reason) => format!("{} ({})", pod.status, reason),
                    None => pod.status.clone(),
                };
                Row::new(vec![
                    Cell::from(pod.pod_name.clone()),
                    Cell::from(pod.app_name.clone()),
                    Cell::from(status).style(status_style(&pod.status)),
                    Cell::from(pod.age.clone().unwrap_or_default()),
                ])
            })
            .collect()
    });

    let mut title = format!(" {} ", pane.cluster);
    if pane.view.is_loading() {
        title.push_str("(loading) ");
    } else if pane.view.last_error().is_some() {
        title.push_str("(unreachable) ");
    }

    let table = Table::new(rows, [
        Constraint::Percentage(40),
        Constraint::Percentage(25),
        Constraint::Percentage(25),
        Constraint::Percentage(10),
    ])
    .header(header_row(&["Pod", "App", "Status", "Age"]))
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .block(pane_block(title, focused));

    let mut state = TableState::default().with_selected(focused.then_some(pane.selected));
    f.render_stateful_widget(table, area, &mut state);
}

fn render_tee(f: &mut Frame, area: Rect, panel: &TeePanel) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let rows: Vec<Row> = panel.view.with_snapshot(|containers| {
        containers
            .iter()
            .map(|c| {
                let env_style = if c.is_sev_snp() { Style::default().fg(Color::Magenta) } else { Style::default() };
                Row::new(vec![
                    Cell::from(c.name.clone()),
                    Cell::from(c.image.clone()),
                    Cell::from(c.status.clone()).style(status_style(&c.status)),
                    Cell::from(c.environment.clone()).style(env_style),
                ])
            })
            .collect()
    });

    let mut title = " Podman containers ".to_string();
    if let Some(err) = panel.view.last_error() {
        title = format!(" Podman containers (stale: {err}) ");
    }
    let table = Table::new(rows, [
        Constraint::Percentage(30),
        Constraint::Percentage(35),
        Constraint::Percentage(20),
        Constraint::Percentage(15),
    ])
    .header(header_row(&["Container", "Image", "Status", "Environment"]))
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .block(pane_block(title, true));
    let mut state = TableState::default().with_selected(Some(panel.selected));
    f.render_stateful_widget(table, parts[0], &mut state);

    let busy = if panel.loading.is_active() { " Operation log (running) " } else { " Operation log " };
    let log = panel.operation_log().unwrap_or_default();
    let log_view = Paragraph::new(log)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(busy));
    f.render_widget(log_view, parts[1]);
}

fn render_popup(f: &mut Frame, title: &str, text: &str) {
    let area = f.area();
    let width = area.width.min(70);
    let height = 6u16.min(area.height);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
    f.render_widget(Clear, popup);
    let body = Paragraph::new(text.to_string())
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(body, popup);
}
