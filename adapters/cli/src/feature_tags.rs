//! Tags naming terrain features on the command line.

use skirmish_core::MapFeature;

/// Tag and feature pairs accepted by `--feature tag:range`.
pub(crate) const FEATURE_TAGS: [(&str, MapFeature); 19] = [
    ("difficult", MapFeature::Difficult),
    ("statue", MapFeature::Statue),
    ("magic", MapFeature::SacredCircle),
    ("summoning", MapFeature::SummoningCircle),
    ("spikestones", MapFeature::SpikeStones),
    ("bloodrock", MapFeature::BloodRock),
    ("haunted", MapFeature::Haunted),
    ("risky", MapFeature::Risky),
    ("pit", MapFeature::Pit),
    ("lava", MapFeature::Lava),
    ("smoke", MapFeature::Smoke),
    ("forest", MapFeature::Forest),
    ("elemental", MapFeature::ElementalWall),
    ("start-a", MapFeature::StartA),
    ("start-b", MapFeature::StartB),
    ("exit-a", MapFeature::ExitA),
    ("exit-b", MapFeature::ExitB),
    ("victory-a", MapFeature::VictoryA),
    ("victory-b", MapFeature::VictoryB),
];

/// Feature named by `tag`, ignoring case.
pub(crate) fn feature_for_tag(tag: &str) -> Option<MapFeature> {
    FEATURE_TAGS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(tag))
        .map(|(_, feature)| *feature)
}
