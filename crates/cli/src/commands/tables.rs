use balloonbot_core::pricing::tables::PricingTables;
use balloonbot_core::pricing::TANK_VOLUME_M3;

use super::CommandResult;

pub fn run() -> CommandResult {
    CommandResult::output(render(&PricingTables::standard()))
}

fn render(tables: &PricingTables) -> String {
    let mut lines =
        vec![format!("helium coefficients (m³ per balloon, tank = {TANK_VOLUME_M3} m³)")];

    lines.push("latex:".to_string());
    for (label, coefficient) in tables.latex_entries() {
        lines.push(format!("- {label:>3}  {coefficient}"));
    }

    lines.push("foil:".to_string());
    for (form, size, coefficient) in tables.foil_entries() {
        lines.push(format!("- {:<6} {:>4}  {coefficient}", form.name(), size.label()));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use balloonbot_core::pricing::tables::PricingTables;

    use super::render;

    #[test]
    fn every_table_row_is_listed() {
        let tables = PricingTables::standard();
        let output = render(&tables);

        let rows = output.lines().filter(|line| line.starts_with("- ")).count();
        assert_eq!(rows, tables.latex_entries().len() + tables.foil_entries().len());
        assert!(output.contains("heart   32\"  0.036"));
        assert!(output.contains("-  10  0.009"));
    }
}
