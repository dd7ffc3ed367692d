//! Headless Force Generator
//!
//! Builds a lance or company for a faction and era from a TOML catalog and a
//! directory of rulesets, then prints the order of battle as text or JSON.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use orbat::core::types::{GenerationRule, MissionRole, NodeId, UnitType, WeightClass};
use orbat::force::{render_listing, ListingEntry};
use orbat::{
    ForceGenerator, ForceNode, ForceTree, FormationType, GenerationConfig, InMemoryCatalog,
    OrbatError, Result, RulesetLibrary, TableFormationBuilder, UnitCatalog,
};

/// Headless Force Generator - order of battle for a faction and year
#[derive(Parser, Debug)]
#[command(name = "orbat_runner")]
#[command(about = "Generate an order of battle and print it")]
struct Args {
    /// Unit catalog TOML file
    #[arg(long, default_value = "data/catalog.toml")]
    catalog: PathBuf,

    /// Directory of ruleset TOML files
    #[arg(long, default_value = "data/rulesets")]
    rulesets: PathBuf,

    /// Generation config TOML file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Faction key (e.g. FS, DC, CHH)
    #[arg(long, default_value = "FS")]
    faction: String,

    #[arg(long, default_value_t = 3025)]
    year: i32,

    /// Unit type of every element
    #[arg(long, default_value = "Mek")]
    unit_type: UnitType,

    /// Weight class of the force (UL, L, M, H, A, SH)
    #[arg(long)]
    weight: Option<WeightClass>,

    /// Rating code on the faction's scale
    #[arg(long)]
    rating: Option<String>,

    /// Number of lances; more than one builds a company
    #[arg(long, default_value_t = 1)]
    lances: usize,

    /// Elements per lance
    #[arg(long, default_value_t = 4)]
    size: usize,

    /// Formation type applied to every lance (e.g. Battle, Fire, Recon)
    #[arg(long)]
    formation: Option<String>,

    /// Give the first lance the command role
    #[arg(long)]
    command_lance: bool,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("orbat=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GenerationConfig::load(path)?,
        None => GenerationConfig::default(),
    };
    config.seed = args.seed.unwrap_or_else(|| rand::random());

    let catalog = InMemoryCatalog::load(&args.catalog)?;
    if catalog.faction(&args.faction).is_none() {
        return Err(OrbatError::UnknownFaction(args.faction.clone()));
    }
    let rules = RulesetLibrary::load_dir(&args.rulesets)?;
    tracing::info!(
        models = catalog.len(),
        rulesets = rules.len(),
        seed = config.seed,
        "Loaded catalog and rulesets"
    );

    let formation = match &args.formation {
        Some(name) => Some(FormationType::named(name).ok_or_else(|| {
            OrbatError::InvalidConfig(format!("unknown formation type: {}", name))
        })?),
        None => None,
    };

    let mut tree = ForceTree::new();
    let root = build_skeleton(&mut tree, &args, formation);

    let builder = TableFormationBuilder::new(&catalog);
    let mut generator = ForceGenerator::new(&catalog, &builder, &rules, config);
    generator.build(&mut tree, root);

    let unresolved = tree.unresolved_leaves(root);
    if !unresolved.is_empty() {
        tracing::warn!(count = unresolved.len(), "Some elements could not be generated");
    }

    match args.format.as_str() {
        "json" => {
            let entry = ListingEntry::build(&tree, root, &rules);
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        _ => print!("{}", render_listing(&tree, root, &rules)),
    }
    Ok(())
}

/// Company of lances, or a single lance, with every element still open
fn build_skeleton(tree: &mut ForceTree, args: &Args, formation: Option<FormationType>) -> NodeId {
    let mut top = ForceNode::new(&args.faction, args.year).with_unit_type(args.unit_type);
    if let Some(wc) = args.weight {
        top = top.with_weight_class(wc);
    }
    if let Some(rating) = &args.rating {
        top = top.with_rating(rating);
    }

    let lance_template = |node: ForceNode| {
        let node = node.with_echelon(3).with_generation_rule(GenerationRule::Group);
        match &formation {
            Some(ft) => node.with_formation(ft.clone()),
            None => node,
        }
    };

    let root = if args.lances > 1 {
        tree.add_root(top.with_echelon(4).with_name("{ordinal} Company"))
    } else {
        tree.add_root(lance_template(top))
    };

    let lances: Vec<NodeId> = if args.lances > 1 {
        (0..args.lances)
            .map(|i| {
                let mut lance = lance_template(tree.create_child(root, i));
                if i == 0 && args.command_lance {
                    lance.roles.insert(MissionRole::Command);
                    lance.name = Some("Command Lance".into());
                } else {
                    lance.name = Some("{phonetic} Lance".into());
                }
                tree.add_subforce(root, lance)
            })
            .collect()
    } else {
        vec![root]
    };

    for lance in lances {
        for i in 0..args.size {
            let mut element = tree.create_child(lance, i);
            element.element = true;
            element.echelon = Some(0);
            tree.add_subforce(lance, element);
        }
    }
    root
}
