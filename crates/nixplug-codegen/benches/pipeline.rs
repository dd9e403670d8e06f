#![allow(
  clippy::expect_used,
  clippy::unwrap_used,
  reason = "Fine in benchmarks"
)]
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use nixplug_codegen::{ModuleOptions, OutputCategory, generate_module};
use nixplug_extract::{PluginSchema, Project, extract_plugin};
use oxc_allocator::Allocator;

const PLUGIN_SMALL: &str = r#"
import { definePluginSettings } from "@api/Settings";
import { OptionType } from "@utils/types";

const settings = definePluginSettings({
  enabled: { type: OptionType.BOOLEAN, default: true },
  prefix: { type: OptionType.STRING, description: "Command prefix" },
});

export default definePlugin({ name: "Small", description: "A small plugin", settings });
"#;

const PLUGIN_LARGE: &str = r#"
import { definePluginSettings } from "@api/Settings";
import { OptionType } from "@utils/types";

const enum Position {
  Top = "top",
  Bottom = "bottom",
  Left = "left",
  Right = "right",
}

const sizes = [16, 24, 32, 48, 64];

const settings = definePluginSettings({
  showInSidebar: {
    type: OptionType.BOOLEAN,
    description: "Show the folder sidebar",
    default: true,
    restartNeeded: true,
  },
  position: {
    type: OptionType.SELECT,
    description: "Where to place the sidebar",
    options: [
      { label: "Top", value: Position.Top },
      { label: "Bottom", value: Position.Bottom, default: true },
      { label: "Left", value: Position.Left },
      { label: "Right", value: Position.Right },
    ],
  },
  iconSize: {
    type: OptionType.SELECT,
    description: "Icon size",
    options: sizes.map(size => ({ label: `${size}px`, value: size })),
  },
  opacity: {
    type: OptionType.SLIDER,
    description: "Sidebar opacity",
    markers: [0, 0.25, 0.5, 0.75, 1],
    default: 0.75,
  },
  customCss: {
    type: OptionType.STRING,
    description: "Extra CSS with ${variables} and ''quotes''",
    default: ".folder {\n  color: red;\n}",
  },
  keybinds: {
    type: OptionType.COMPONENT,
    description: "Keybinds",
    component: () => null,
  },
  maxFolders: { type: OptionType.NUMBER, default: 12 },
  accounts: { type: OptionType.BIGINT },
  ignored: { type: OptionType.CUSTOM, default: [] },
  hiddenSetting: { type: OptionType.BOOLEAN, hidden: true, default: false },
});

export default definePlugin({ name: "Large", description: "A larger plugin", settings });
"#;

fn extract(source: &str) -> PluginSchema {
  let allocator = Allocator::default();
  let project = Project::from_sources(&allocator, [("plugins/bench/index.tsx", source)])
    .expect("parse");
  extract_plugin(&project)
}

fn bench_extraction(c: &mut Criterion) {
  let mut group = c.benchmark_group("extraction");

  for (name, source) in [("small", PLUGIN_SMALL), ("large", PLUGIN_LARGE)] {
    group.bench_with_input(BenchmarkId::new("extract", name), &source, |b, source| {
      b.iter(|| extract(black_box(source)));
    });
  }

  group.finish();
}

fn bench_generation(c: &mut Criterion) {
  let mut group = c.benchmark_group("generation");
  let options = ModuleOptions::new("Vencord", "Equicord");

  for (name, source) in [("small", PLUGIN_SMALL), ("large", PLUGIN_LARGE)] {
    let schema = extract(source);
    group.bench_with_input(BenchmarkId::new("module", name), &schema, |b, schema| {
      b.iter(|| {
        generate_module(
          black_box(&[schema]),
          Some(OutputCategory::Shared),
          black_box(&options),
        )
      });
    });
  }

  group.finish();
}

criterion_group!(benches, bench_extraction, bench_generation);
criterion_main!(benches);
