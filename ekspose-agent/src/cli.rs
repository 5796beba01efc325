use clap::Parser;

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// override default kubeconfig
    #[arg(long = "kubeconfig")]
    pub kube_config: Option<String>,
    /// override default kubeconfig context
    #[arg(long)]
    pub kube_context: Option<String>,
    /// enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose_logging: bool,
}
