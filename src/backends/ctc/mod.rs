pub mod detect;
pub mod direct;
pub mod summary;
pub mod xml_merge;

use std::path::Path;

use crate::core::engine::runner::Invocation;

pub use detect::{CtcGeneration, CtcInstallation, CtcVersion, detect};
pub use direct::DirectReportStrategy;
pub use xml_merge::XmlMergeStrategy;

const CTC2HTML: &str = "ctc2html.pl";

/// `perl $CTCHOME/ctc2html.pl -nsb -i <txt> -o <dir>`, or `None` without a CTC++ home.
pub fn html_invocation(
    perl: &Path,
    ctc_home: Option<&Path>,
    text_report: &Path,
    output_dir: &Path,
) -> Option<Invocation> {
    let home = ctc_home?;
    Some(
        Invocation::new(perl)
            .arg(home.join(CTC2HTML))
            .args(["-nsb", "-i"])
            .arg(text_report)
            .arg("-o")
            .arg(output_dir),
    )
}
